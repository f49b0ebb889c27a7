use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared::message::{BusMessage, HandshakePayload, PROTOCOL_VERSION, ResponsePayload};
use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::transport::{MemoryTransport, TcpTransport, Transport};
use super::{MessageClientConfig, MessageError};
use crate::ClientConfig;

type PendingRequests = Arc<Mutex<HashMap<Uuid, oneshot::Sender<BusMessage>>>>;

/// Message bus client
///
/// A background task reads the transport. Replies carrying a known
/// `correlation_id` complete the matching [`MessageClient::request`]; every
/// message is also fanned out to [`MessageClient::subscribe`] receivers.
#[derive(Debug, Clone)]
pub struct MessageClient {
    transport: Arc<dyn Transport>,
    event_tx: broadcast::Sender<BusMessage>,
    pending_requests: PendingRequests,
    config: MessageClientConfig,
    shutdown: CancellationToken,
}

impl MessageClient {
    /// Connect to `config.message_tcp_addr` and handshake
    pub async fn from_config(config: &ClientConfig) -> Result<Self, MessageError> {
        let Some(addr) = config.message_tcp_addr.as_deref() else {
            return Err(MessageError::Connection(
                "Message client requires message_tcp_addr".to_string(),
            ));
        };
        let message_config =
            MessageClientConfig::default().with_request_timeout(config.timeout_duration());
        Self::connect(addr, &config.client_name, message_config).await
    }

    /// Connect via TCP and handshake
    pub async fn connect(
        addr: &str,
        client_name: &str,
        config: MessageClientConfig,
    ) -> Result<Self, MessageError> {
        let transport = TcpTransport::connect(addr).await?;
        let client = Self::new(Arc::new(transport), config);

        let payload = HandshakePayload {
            version: PROTOCOL_VERSION,
            client_name: Some(client_name.to_string()),
            client_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            client_id: None,
        };
        let reply = client.request(&BusMessage::handshake(&payload)?).await?;
        let response: ResponsePayload = reply.parse_payload()?;
        if !response.success {
            let _ = client.close().await;
            return Err(MessageError::Handshake(response.message));
        }

        tracing::info!(%addr, "Connected to message bus: {}", response.message);
        Ok(client)
    }

    /// In-process client on the server's broadcast channel (no handshake)
    pub fn memory(server_tx: &broadcast::Sender<BusMessage>) -> Self {
        Self::new(
            Arc::new(MemoryTransport::new(server_tx)),
            MessageClientConfig::default(),
        )
    }

    fn new(transport: Arc<dyn Transport>, config: MessageClientConfig) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let client = Self {
            transport,
            event_tx,
            pending_requests: Arc::new(Mutex::new(HashMap::new())),
            config,
            shutdown: CancellationToken::new(),
        };
        client.spawn_reader();
        client
    }

    fn spawn_reader(&self) {
        let transport = self.transport.clone();
        let event_tx = self.event_tx.clone();
        let pending = self.pending_requests.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            loop {
                let result = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    result = transport.read_message() => result,
                };

                match result {
                    Ok(msg) => {
                        if let Some(correlation_id) = msg.correlation_id {
                            let waiter = pending.lock().remove(&correlation_id);
                            if let Some(tx) = waiter {
                                let _ = tx.send(msg.clone());
                            }
                        }
                        if event_tx.send(msg).is_err() {
                            tracing::trace!("No subscribers for bus message");
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Message bus read failed: {}", e);
                        break;
                    }
                }
            }
            shutdown.cancel();
            pending.lock().clear();
        });
    }

    /// Receiver for every incoming message from now on
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.event_tx.subscribe()
    }

    /// Fire and forget
    pub async fn send(&self, msg: &BusMessage) -> Result<(), MessageError> {
        self.transport.write_message(msg).await
    }

    /// Send and wait for the reply correlated to `msg.request_id`
    pub async fn request(&self, msg: &BusMessage) -> Result<BusMessage, MessageError> {
        let request_id = msg.request_id;
        let (tx, rx) = oneshot::channel();
        self.pending_requests.lock().insert(request_id, tx);

        if let Err(e) = self.send(msg).await {
            self.pending_requests.lock().remove(&request_id);
            return Err(e);
        }

        match tokio::time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(MessageError::Connection(
                "Connection closed before reply".to_string(),
            )),
            Err(_) => {
                self.pending_requests.lock().remove(&request_id);
                Err(MessageError::Timeout(format!(
                    "No reply to {} within {:?}",
                    msg.event_type, self.config.request_timeout
                )))
            }
        }
    }

    /// False once the reader stopped (close or connection loss)
    pub fn is_connected(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    /// Resolves when the connection ends
    pub async fn closed(&self) {
        self.shutdown.cancelled().await
    }

    pub async fn close(&self) -> Result<(), MessageError> {
        self.shutdown.cancel();
        self.transport.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{EventType, SyncPayload};

    #[tokio::test]
    async fn test_memory_client_fans_out() {
        let (server_tx, _) = broadcast::channel(16);
        let client = MessageClient::memory(&server_tx);
        let mut rx = client.subscribe();

        let payload = SyncPayload {
            resource: "order".into(),
            version: 1,
            action: "inserted".into(),
            id: "5".into(),
            data: None,
        };
        server_tx.send(BusMessage::sync(&payload).unwrap()).unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.event_type, EventType::Sync);
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_memory_client_closes() {
        let (server_tx, _) = broadcast::channel::<BusMessage>(16);
        let client = MessageClient::memory(&server_tx);
        client.close().await.unwrap();
        client.closed().await;
        assert!(!client.is_connected());
    }
}
