//! Message bus for realtime order changes
//!
//! ```text
//! order service ──▶ publish() ──▶ broadcast::Sender<BusMessage>
//!                                        │
//!                         ┌──────────────┴──────────────┐
//!                         ▼                             ▼
//!                  TCP client sessions           MemoryTransport
//!                  (one per client)              (same process)
//! ```

mod bus;
mod tcp_server;
pub mod transport;

pub use bus::{BusConfig, MessageBus};
pub use shared::message::{BusMessage, EventType, SyncPayload};
pub use tcp_server::VERSION_MISMATCH;
pub use transport::{MemoryTransport, TcpTransport, Transport};

/// Snapshot of a connected TCP client
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectedClient {
    pub id: String,
    pub addr: Option<String>,
}
