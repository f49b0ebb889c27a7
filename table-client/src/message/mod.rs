//! Message bus client
//!
//! Connects to the order server's TCP bus, performs the protocol handshake
//! and exposes incoming messages as a broadcast stream.

mod client;
mod transport;

pub use client::MessageClient;
pub use shared::message::{BusMessage, EventType};
pub use transport::{MemoryTransport, TcpTransport, Transport};

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Handshake rejected: {0}")]
    Handshake(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Message client settings
#[derive(Debug, Clone)]
pub struct MessageClientConfig {
    /// Wait for correlated responses (handshake included)
    pub request_timeout: Duration,
    /// Capacity of the local fan-out channel
    pub event_capacity: usize,
}

impl Default for MessageClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(3),
            event_capacity: 1024,
        }
    }
}

impl MessageClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
