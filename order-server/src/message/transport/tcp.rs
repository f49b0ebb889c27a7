use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use shared::message::BusMessage;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use super::{Transport, read_frame, write_frame};
use crate::utils::AppError;

/// Framed TCP connection
///
/// Reads and writes lock separate halves, so a forwarder can write while
/// another task is blocked reading.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    read_half: Arc<Mutex<OwnedReadHalf>>,
    write_half: Arc<Mutex<OwnedWriteHalf>>,
    peer: Option<SocketAddr>,
}

impl TcpTransport {
    pub async fn connect(addr: &str) -> Result<Self, AppError> {
        match TcpStream::connect(addr).await {
            Ok(stream) => Ok(Self::from_stream(stream)),
            Err(e) => Err(AppError::internal(format!("Cannot reach bus at {addr}: {e}"))),
        }
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!("TCP_NODELAY not applied: {}", e);
        }
        let peer = stream.peer_addr().ok();
        let (read_half, write_half) = stream.into_split();
        Self {
            read_half: Arc::new(Mutex::new(read_half)),
            write_half: Arc::new(Mutex::new(write_half)),
            peer,
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn read_message(&self) -> Result<BusMessage, AppError> {
        read_frame(&mut *self.read_half.lock().await).await
    }

    async fn write_message(&self, msg: &BusMessage) -> Result<(), AppError> {
        write_frame(&mut *self.write_half.lock().await, msg).await
    }

    async fn close(&self) -> Result<(), AppError> {
        let mut half = self.write_half.lock().await;
        half.shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Bus shutdown failed: {e}")))
    }

    fn peer_addr(&self) -> Option<String> {
        self.peer.map(|addr| addr.to_string())
    }
}
