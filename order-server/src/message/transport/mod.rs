//! Transport layer for the message bus
//!
//! ```text
//!         ┌────────────────────┐
//!         │   Transport Trait  │
//!         └────────┬───────────┘
//!                  │
//!          ┌───────┴────────┐
//!          ▼                ▼
//!    TcpTransport     MemoryTransport
//!    (network)        (same process)
//! ```

mod memory;
mod tcp;

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;

use std::io::ErrorKind;

use async_trait::async_trait;
use shared::message::BusMessage;
use shared::message::frame::{FrameHeader, HEADER_LEN, encode_frame};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::utils::AppError;

#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn read_message(&self) -> Result<BusMessage, AppError>;

    async fn write_message(&self, msg: &BusMessage) -> Result<(), AppError>;

    async fn close(&self) -> Result<(), AppError>;

    fn peer_addr(&self) -> Option<String> {
        None
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
    )
}

/// Read one frame
///
/// A peer that hangs up mid-read maps to `ClientDisconnected`.
pub async fn read_frame<R: AsyncReadExt + Unpin>(reader: &mut R) -> Result<BusMessage, AppError> {
    let io_err = |e: std::io::Error| {
        if is_disconnect(e.kind()) {
            AppError::client_disconnected()
        } else {
            AppError::internal(format!("Bus read failed: {e}"))
        }
    };

    let mut raw = [0u8; HEADER_LEN];
    reader.read_exact(&mut raw).await.map_err(io_err)?;
    let header = FrameHeader::decode(&raw).map_err(|e| AppError::invalid(e.to_string()))?;

    let mut payload = vec![0u8; header.payload_len];
    reader.read_exact(&mut payload).await.map_err(io_err)?;
    Ok(header.into_message(payload))
}

pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    msg: &BusMessage,
) -> Result<(), AppError> {
    let frame = encode_frame(msg);
    async {
        writer.write_all(&frame).await?;
        writer.flush().await
    }
    .await
    .map_err(|e| AppError::internal(format!("Bus write failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;
    use shared::message::{EventType, SyncPayload};

    #[tokio::test]
    async fn test_frame_over_duplex() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        let payload = SyncPayload {
            resource: "order".into(),
            version: 1,
            action: "inserted".into(),
            id: "7".into(),
            data: None,
        };
        let msg = BusMessage::sync(&payload)
            .unwrap()
            .with_correlation_id(uuid::Uuid::new_v4());

        write_frame(&mut a, &msg).await.unwrap();
        let read = read_frame(&mut b).await.unwrap();

        assert_eq!(read.event_type, EventType::Sync);
        assert_eq!(read.request_id, msg.request_id);
        assert_eq!(read.correlation_id, msg.correlation_id);
        let parsed: SyncPayload = read.parse_payload().unwrap();
        assert_eq!(parsed, payload);
    }

    #[tokio::test]
    async fn test_hangup_is_disconnect() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        let err = read_frame(&mut b).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientDisconnected);
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let mut header = vec![0u8; HEADER_LEN];
        header[0] = EventType::Sync as u8;
        header[33..].copy_from_slice(&u32::MAX.to_le_bytes());
        a.write_all(&header).await.unwrap();

        let err = read_frame(&mut b).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }
}
