//! Client-side transports
//!
//! Frames are encoded with [`shared::message::frame`].

use std::sync::Arc;

use async_trait::async_trait;
use shared::message::frame::{FrameHeader, HEADER_LEN, encode_frame};
use shared::message::{BusMessage, SyncPayload};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, broadcast};

use super::MessageError;

#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_message(&self) -> Result<BusMessage, MessageError>;
    async fn write_message(&self, msg: &BusMessage) -> Result<(), MessageError>;
    async fn close(&self) -> Result<(), MessageError>;
}

#[derive(Debug, Clone)]
pub struct TcpTransport {
    reader: Arc<Mutex<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, MessageError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| MessageError::Connection(format!("{addr}: {e}")))?;
        let _ = stream.set_nodelay(true);
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: Arc::new(Mutex::new(reader)),
            writer: Arc::new(Mutex::new(writer)),
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> Result<BusMessage, MessageError> {
        let mut reader = self.reader.lock().await;

        let mut raw = [0u8; HEADER_LEN];
        reader.read_exact(&mut raw).await?;
        let header = FrameHeader::decode(&raw)
            .map_err(|e| MessageError::InvalidMessage(e.to_string()))?;

        let mut payload = vec![0u8; header.payload_len];
        reader.read_exact(&mut payload).await?;
        Ok(header.into_message(payload))
    }

    async fn write_message(&self, msg: &BusMessage) -> Result<(), MessageError> {
        let mut writer = self.writer.lock().await;
        writer.write_all(&encode_frame(msg)).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), MessageError> {
        let mut writer = self.writer.lock().await;
        writer.shutdown().await?;
        Ok(())
    }
}

/// Receive-only transport on an in-process broadcast channel
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    rx: Arc<Mutex<broadcast::Receiver<BusMessage>>>,
}

impl MemoryTransport {
    pub fn new(server_tx: &broadcast::Sender<BusMessage>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(server_tx.subscribe())),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<BusMessage, MessageError> {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Ok(msg) => Ok(msg),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Memory transport lagged by {} messages, requesting resync", n);
                Ok(BusMessage::sync(&SyncPayload::resync(n))?)
            }
            Err(broadcast::error::RecvError::Closed) => {
                Err(MessageError::Connection("Server channel closed".to_string()))
            }
        }
    }

    async fn write_message(&self, _msg: &BusMessage) -> Result<(), MessageError> {
        Err(MessageError::Connection(
            "In-process transport is receive-only".to_string(),
        ))
    }

    async fn close(&self) -> Result<(), MessageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::message::{EventType, RESYNC_ACTION};

    #[tokio::test]
    async fn test_memory_transport_resyncs_on_lag() {
        let (tx, _) = broadcast::channel(2);
        let transport = MemoryTransport::new(&tx);
        for _ in 0..5 {
            tx.send(BusMessage::new(EventType::Notification, Vec::new())).unwrap();
        }

        let msg = transport.read_message().await.unwrap();
        let sync: SyncPayload = msg.parse_payload().unwrap();
        assert_eq!(sync.action, RESYNC_ACTION);
    }

    #[tokio::test]
    async fn test_memory_transport_is_receive_only() {
        let (tx, _) = broadcast::channel(2);
        let transport = MemoryTransport::new(&tx);
        let msg = BusMessage::new(EventType::Notification, Vec::new());
        assert!(matches!(
            transport.write_message(&msg).await,
            Err(MessageError::Connection(_))
        ));
    }
}
