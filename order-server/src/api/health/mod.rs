//! Health check routes
//!
//! | Path | Method | Purpose |
//! |------|--------|---------|
//! | /health | GET | liveness |
//! | /health/detailed | GET | database and message bus checks |

use std::sync::OnceLock;
use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

const VERSION: &str = env!("CARGO_PKG_VERSION");

static STARTED: OnceLock<Instant> = OnceLock::new();

pub fn router() -> Router<ServerState> {
    // Uptime counts from router construction
    STARTED.get_or_init(Instant::now);
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(detailed_health))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
}

#[derive(Serialize)]
pub struct Check {
    status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connected_clients: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Check {
    fn passed() -> Self {
        Self {
            status: CheckStatus::Ok,
            latency_ms: None,
            connected_clients: None,
            message: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Error,
            message: Some(message.into()),
            ..Self::passed()
        }
    }
}

#[derive(Serialize)]
pub struct Checks {
    database: Check,
    message_bus: Check,
}

#[derive(Serialize)]
pub struct DetailedHealthResponse {
    /// healthy | degraded
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    checks: Checks,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: VERSION,
        environment: state.config.environment.clone(),
    })
}

pub async fn detailed_health(State(state): State<ServerState>) -> Json<DetailedHealthResponse> {
    let database = match state.db.ping().await {
        Ok(latency) => Check {
            latency_ms: Some(latency.as_millis() as u64),
            ..Check::passed()
        },
        Err(e) => Check::failed(e.message),
    };

    let bus = state.message_bus();
    let message_bus = if bus.is_running() {
        Check {
            connected_clients: Some(bus.connected_clients().len()),
            ..Check::passed()
        }
    } else {
        Check::failed("Message bus is shut down")
    };

    let healthy = database.status == CheckStatus::Ok && message_bus.status == CheckStatus::Ok;
    let uptime_seconds = STARTED.get_or_init(Instant::now).elapsed().as_secs();

    Json(DetailedHealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        version: VERSION,
        uptime_seconds,
        checks: Checks {
            database,
            message_bus,
        },
    })
}
