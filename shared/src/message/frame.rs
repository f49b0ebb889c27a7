//! Wire framing shared by the TCP server and clients
//!
//! ```text
//! event_type:u8 | request_id:16 | correlation_id:16 | len:u32 LE | payload
//! ```
//!
//! A nil correlation id means "none".

use thiserror::Error;
use uuid::Uuid;

use super::{BusMessage, EventType};

pub const HEADER_LEN: usize = 1 + 16 + 16 + 4;

/// Frames announcing a larger payload are rejected before allocating
pub const MAX_PAYLOAD_LEN: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("Unknown event type {0}")]
    UnknownEventType(u8),
    #[error("Payload too large: {0} bytes")]
    TooLarge(usize),
}

/// Decoded fixed-size frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub event_type: EventType,
    pub request_id: Uuid,
    pub correlation_id: Option<Uuid>,
    pub payload_len: usize,
}

impl FrameHeader {
    pub fn decode(bytes: &[u8; HEADER_LEN]) -> Result<Self, FrameError> {
        let event_type = EventType::try_from(bytes[0]).map_err(FrameError::UnknownEventType)?;

        let uuid_at = |offset: usize| {
            let mut raw = [0u8; 16];
            raw.copy_from_slice(&bytes[offset..offset + 16]);
            Uuid::from_bytes(raw)
        };
        let mut len = [0u8; 4];
        len.copy_from_slice(&bytes[33..HEADER_LEN]);
        let payload_len = u32::from_le_bytes(len) as usize;
        if payload_len > MAX_PAYLOAD_LEN {
            return Err(FrameError::TooLarge(payload_len));
        }

        Ok(Self {
            event_type,
            request_id: uuid_at(1),
            correlation_id: Some(uuid_at(17)).filter(|id| !id.is_nil()),
            payload_len,
        })
    }

    pub fn into_message(self, payload: Vec<u8>) -> BusMessage {
        BusMessage {
            request_id: self.request_id,
            event_type: self.event_type,
            correlation_id: self.correlation_id,
            payload,
        }
    }
}

/// Header and payload in one buffer
pub fn encode_frame(msg: &BusMessage) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + msg.payload.len());
    frame.push(msg.event_type as u8);
    frame.extend_from_slice(msg.request_id.as_bytes());
    frame.extend_from_slice(msg.correlation_id.unwrap_or(Uuid::nil()).as_bytes());
    frame.extend_from_slice(&(msg.payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&msg.payload);
    frame
}
