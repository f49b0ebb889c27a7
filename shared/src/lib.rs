//! Shared types for the table ordering workspace
//!
//! Domain models, the order lifecycle, total arithmetic, dashboard
//! aggregation, error codes and message bus types used by both
//! order-server and table-client.

pub mod error;
pub mod message;
pub mod models;
pub mod order;
pub mod stats;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use message::{BusMessage, EventType};
pub use order::OrderStatus;
