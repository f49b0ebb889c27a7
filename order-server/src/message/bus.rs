use std::sync::Arc;

use dashmap::DashMap;
use shared::message::BusMessage;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::ConnectedClient;
use super::transport::{MemoryTransport, Transport};
use crate::utils::AppError;

#[derive(Debug, Clone)]
pub struct BusConfig {
    pub tcp_listen_addr: String,
    /// Messages buffered per subscriber before it lags and gets a resync
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            tcp_listen_addr: "0.0.0.0:8081".to_string(),
            channel_capacity: 1024,
        }
    }
}

/// Server-to-client broadcast bus
///
/// Clones share one channel, client registry and shutdown token.
#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<BusMessage>,
    pub(crate) config: BusConfig,
    shutdown: CancellationToken,
    pub(crate) clients: Arc<DashMap<String, Arc<dyn Transport>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::from_config(BusConfig::default())
    }

    pub fn from_config(config: BusConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            tx,
            config,
            shutdown: CancellationToken::new(),
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Broadcast to every subscriber; a bus nobody listens to drops the message
    pub async fn publish(&self, msg: BusMessage) -> Result<(), AppError> {
        let event_type = msg.event_type;
        match self.tx.send(msg) {
            Ok(receivers) => tracing::trace!(%event_type, receivers, "Bus message published"),
            Err(_) => tracing::trace!(%event_type, "Bus message dropped, no subscribers"),
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.tx.subscribe()
    }

    /// Same-process transport receiving every broadcast
    pub fn memory_transport(&self) -> MemoryTransport {
        MemoryTransport::new(&self.tx)
    }

    pub fn sender(&self) -> &broadcast::Sender<BusMessage> {
        &self.tx
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// TCP clients past the handshake
    pub fn connected_clients(&self) -> Vec<ConnectedClient> {
        self.clients
            .iter()
            .map(|entry| ConnectedClient {
                id: entry.key().clone(),
                addr: entry.value().peer_addr(),
            })
            .collect()
    }

    /// Stop the TCP server and every client session
    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
