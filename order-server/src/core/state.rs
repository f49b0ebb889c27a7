use std::sync::Arc;

use chrono_tz::Tz;
use dashmap::DashMap;
use shared::message::{BusMessage, SyncPayload};
use sqlx::SqlitePool;

use crate::core::{Config, Result};
use crate::db::DbService;
use crate::message::{BusConfig, MessageBus};
use crate::utils::time;

/// Per-resource version counters
///
/// Each `broadcast_sync` bumps the resource's counter so clients can tell
/// newer signals from older ones.
#[derive(Debug, Default)]
pub struct ResourceVersions {
    versions: DashMap<String, u64>,
}

impl ResourceVersions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment and return the new version (first call returns 1)
    pub fn increment(&self, resource: &str) -> u64 {
        let mut entry = self.versions.entry(resource.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Current version, 0 if never incremented
    pub fn get(&self, resource: &str) -> u64 {
        self.versions.get(resource).map(|v| *v).unwrap_or(0)
    }
}

/// Shared server state
///
/// Cheap to clone: every field is either `Copy` or reference counted.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | immutable configuration |
/// | db | SQLite pool |
/// | message_bus | realtime broadcast bus |
/// | resource_versions | sync version counters |
/// | tz | business time zone |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    pub message_bus: MessageBus,
    pub resource_versions: Arc<ResourceVersions>,
    pub tz: Tz,
}

impl ServerState {
    pub fn new(config: Config, db: DbService, message_bus: MessageBus, tz: Tz) -> Self {
        Self {
            config,
            db,
            message_bus,
            resource_versions: Arc::new(ResourceVersions::new()),
            tz,
        }
    }

    /// Build state from configuration
    ///
    /// 1. work directory
    /// 2. time zone
    /// 3. database (migrations applied)
    /// 4. message bus
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir()?;
        let tz = time::parse_timezone(&config.timezone)?;
        let db = DbService::new(&config.database_url).await?;
        let message_bus = MessageBus::from_config(BusConfig {
            tcp_listen_addr: config.message_tcp_addr(),
            ..Default::default()
        });

        tracing::info!(
            database = %config.database_url,
            timezone = %tz,
            environment = %config.environment,
            "Server state initialized"
        );

        Ok(Self::new(config.clone(), db, message_bus, tz))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn message_bus(&self) -> &MessageBus {
        &self.message_bus
    }

    /// Broadcast a resource change to every subscriber
    ///
    /// Delivery is best effort; failures are logged and never surface to
    /// the request that caused the change.
    pub async fn broadcast_sync<T: serde::Serialize>(
        &self,
        resource: &str,
        action: &str,
        id: &str,
        data: Option<&T>,
    ) {
        let version = self.resource_versions.increment(resource);
        let payload = SyncPayload {
            resource: resource.to_string(),
            version,
            action: action.to_string(),
            id: id.to_string(),
            data: data.and_then(|d| serde_json::to_value(d).ok()),
        };

        let msg = match BusMessage::sync(&payload) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!(resource, id, "Failed to encode sync payload: {}", e);
                return;
            }
        };
        if let Err(e) = self.message_bus.publish(msg).await {
            tracing::warn!(resource, id, "Failed to publish sync: {}", e);
        }
    }
}
