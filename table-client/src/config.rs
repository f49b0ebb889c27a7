//! Client configuration

use std::time::Duration;

/// Connection settings for the order server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g. "http://localhost:3000")
    pub base_url: String,

    /// Message bus TCP address (e.g. "localhost:8081"); realtime is off when unset
    pub message_tcp_addr: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Table this client is bound to (from the QR code URL)
    pub table_id: Option<String>,

    /// Name announced in the bus handshake
    pub client_name: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            message_tcp_addr: None,
            timeout: 30,
            table_id: None,
            client_name: "table-client".to_string(),
        }
    }

    pub fn with_message_tcp_addr(mut self, addr: impl Into<String>) -> Self {
        self.message_tcp_addr = Some(addr.into());
        self
    }

    /// Set the request timeout in seconds
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_table_id(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
