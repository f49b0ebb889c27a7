//! Order domain logic
//!
//! - [`lifecycle`]: status state machine
//! - [`money`]: subtotal, fee and total arithmetic

pub mod lifecycle;
pub mod money;

// Re-exports
pub use lifecycle::{OrderStatus, StatusAction};
pub use money::{OrderTotals, line_total, order_totals, subtotal, total_items};
