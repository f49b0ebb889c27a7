//! Order workflows
//!
//! - **submit**: validate a checkout and persist header + items in one
//!   transaction, then broadcast `inserted`
//! - **transition**: compare-and-swap status change, then broadcast `updated`
//!
//! ```text
//! HTTP handler ─▶ workflow ─▶ repository (sqlx tx) ─▶ commit
//!                                                     │
//!                                          MessageBus ◀┘ (best effort)
//! ```

mod service;

pub use service::{submit, transition, validate_submission};
