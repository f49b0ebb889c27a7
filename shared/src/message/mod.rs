//! Message bus types
//!
//! Shared by order-server and clients for in-process (memory) and network
//! (TCP) delivery of realtime order changes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod frame;
pub mod payload;
pub use payload::*;

/// Protocol version checked during handshake
pub const PROTOCOL_VERSION: u16 = 1;

/// Bus event type, encoded as one byte on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Client hello, answered with a Response
    Handshake = 0,
    /// Human-readable system notice
    Notification = 1,
    /// Resource change signal
    Sync = 2,
    /// Reply correlated to a request
    Response = 3,
}

impl TryFrom<u8> for EventType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventType::Handshake),
            1 => Ok(EventType::Notification),
            2 => Ok(EventType::Sync),
            3 => Ok(EventType::Response),
            other => Err(other),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventType::Handshake => write!(f, "handshake"),
            EventType::Notification => write!(f, "notification"),
            EventType::Sync => write!(f, "sync"),
            EventType::Response => write!(f, "response"),
        }
    }
}

/// Bus message envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub event_type: EventType,
    pub correlation_id: Option<Uuid>,
    pub payload: Vec<u8>,
}

impl BusMessage {
    pub fn new(event_type: EventType, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event_type,
            correlation_id: None,
            payload,
        }
    }

    /// Serialize `payload` as JSON into a new message
    pub fn encode<T: Serialize>(event_type: EventType, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event_type, serde_json::to_vec(payload)?))
    }

    pub fn with_correlation_id(mut self, id: Uuid) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn handshake(payload: &HandshakePayload) -> Result<Self, serde_json::Error> {
        Self::encode(EventType::Handshake, payload)
    }

    pub fn sync(payload: &SyncPayload) -> Result<Self, serde_json::Error> {
        Self::encode(EventType::Sync, payload)
    }

    pub fn response(payload: &ResponsePayload) -> Result<Self, serde_json::Error> {
        Self::encode(EventType::Response, payload)
    }

    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}
