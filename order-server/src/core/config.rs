use std::path::PathBuf;

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment (a `.env` file is
/// loaded first when present):
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | database and log root |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | MESSAGE_TCP_PORT | 8081 | realtime bus port |
/// | DATABASE_URL | sqlite:{WORK_DIR}/dinein.db | SQLite location |
/// | TIMEZONE | Asia/Jakarta | business time zone |
/// | ENVIRONMENT | development | environment label |
/// | LOG_LEVEL | info | log level |
/// | LOG_DIR | (unset) | daily rolling log files |
/// | REQUEST_TIMEOUT_MS | 30000 | per-request timeout |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/dinein HTTP_PORT=8080 cargo run -p order-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub message_tcp_port: u16,
    pub database_url: String,
    /// IANA name, validated when the state is built
    pub timezone: String,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| default_database_url(&work_dir));

        Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            message_tcp_port: std::env::var("MESSAGE_TCP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8081),
            database_url,
            timezone: std::env::var("TIMEZONE").unwrap_or_else(|_| "Asia/Jakarta".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.trim().is_empty()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            work_dir,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn work_dir_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
    }

    /// Create the work directory if missing
    pub fn ensure_work_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.work_dir_path())
    }

    pub fn http_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::from(([0, 0, 0, 0], self.http_port))
    }

    pub fn message_tcp_addr(&self) -> String {
        format!("0.0.0.0:{}", self.message_tcp_port)
    }
}

fn default_database_url(work_dir: &str) -> String {
    format!("sqlite:{}/dinein.db", work_dir.trim_end_matches('/'))
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_database_url() {
        assert_eq!(default_database_url("./data/"), "sqlite:./data/dinein.db");
    }

    #[test]
    fn test_addresses() {
        let mut config = Config::default();
        config.http_port = 3100;
        config.message_tcp_port = 8181;
        assert_eq!(config.http_addr().port(), 3100);
        assert_eq!(config.message_tcp_addr(), "0.0.0.0:8181");
    }
}
