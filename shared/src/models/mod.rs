//! Data models
//!
//! Shared between order-server and clients (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod cart;
pub mod menu;
pub mod order;
pub mod payment;

// Re-exports
pub use cart::*;
pub use menu::*;
pub use order::*;
pub use payment::*;
