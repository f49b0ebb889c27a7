//! In-process transport

use std::sync::Arc;

use async_trait::async_trait;
use shared::message::{BusMessage, SyncPayload};
use tokio::sync::Mutex;
use tokio::sync::broadcast::{self, error::RecvError};

use super::Transport;
use crate::utils::AppError;

/// Receive-only view of the bus for same-process subscribers
///
/// A lagging reader gets a resync sync message in place of the dropped
/// ones, matching what TCP clients receive.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    rx: Arc<Mutex<broadcast::Receiver<BusMessage>>>,
}

impl MemoryTransport {
    pub fn new(tx: &broadcast::Sender<BusMessage>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(tx.subscribe())),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_message(&self) -> Result<BusMessage, AppError> {
        match self.rx.lock().await.recv().await {
            Ok(msg) => Ok(msg),
            Err(RecvError::Lagged(dropped)) => {
                tracing::warn!(dropped, "Memory subscriber lagged, sending resync");
                BusMessage::sync(&SyncPayload::resync(dropped))
                    .map_err(|e| AppError::internal(e.to_string()))
            }
            Err(RecvError::Closed) => Err(AppError::client_disconnected()),
        }
    }

    async fn write_message(&self, _msg: &BusMessage) -> Result<(), AppError> {
        Err(AppError::invalid("In-process bus subscribers cannot publish"))
    }

    async fn close(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn peer_addr(&self) -> Option<String> {
        Some("memory".to_string())
    }
}
