use serde::{Deserialize, Serialize};

use crate::models::OrderDetail;

/// Resource name used for order sync messages
pub const ORDER_RESOURCE: &str = "order";

/// Sync action telling a lagging client to refetch everything
pub const RESYNC_ACTION: &str = "resync";

// ==================== Payloads ====================

/// Handshake payload (client -> server)
///
/// The server rejects the connection when `version` differs from its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakePayload {
    pub version: u16,
    pub client_name: Option<String>,
    pub client_version: Option<String>,
    /// Stable client id; the server assigns one when absent
    pub client_id: Option<String>,
}

/// Sync signal (server -> all clients)
///
/// Broadcast after a resource changes so subscribers can refetch.
///
/// # Example
/// - `resource`: "order"
/// - `version`: 42
/// - `action`: "inserted"
/// - `id`: "1234567890"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncPayload {
    pub resource: String,
    /// Per-resource counter, monotonically increasing
    pub version: u64,
    pub action: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Generic response payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

// ==================== Order changes ====================

/// Kind of change to the orders collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderChange {
    Inserted,
    Updated,
}

impl OrderChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
        }
    }

    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "inserted" => Some(Self::Inserted),
            "updated" => Some(Self::Updated),
            _ => None,
        }
    }
}

/// Decoded order sync message
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub change: OrderChange,
    pub order_id: i64,
    pub version: u64,
    /// Row snapshot, when the server attached one
    pub order: Option<OrderDetail>,
}

impl OrderEvent {
    /// `None` for other resources, unknown actions or malformed ids
    pub fn from_sync(payload: &SyncPayload) -> Option<Self> {
        if payload.resource != ORDER_RESOURCE {
            return None;
        }
        let change = OrderChange::parse(&payload.action)?;
        let order_id = payload.id.parse().ok()?;
        let order = payload
            .data
            .clone()
            .and_then(|v| serde_json::from_value(v).ok());
        Some(Self {
            change,
            order_id,
            version: payload.version,
            order,
        })
    }
}

// ==================== Convenience Constructors ====================

impl SyncPayload {
    /// Tell a subscriber that missed `dropped` messages to refetch everything
    pub fn resync(dropped: u64) -> Self {
        Self {
            resource: ORDER_RESOURCE.to_string(),
            version: 0,
            action: RESYNC_ACTION.to_string(),
            id: String::new(),
            data: Some(serde_json::json!({ "reason": "lagged", "dropped_messages": dropped })),
        }
    }
}

impl ResponsePayload {
    pub fn success(message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            error_code: None,
        }
    }

    pub fn error(message: impl Into<String>, code: Option<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error_code: code,
        }
    }
}
