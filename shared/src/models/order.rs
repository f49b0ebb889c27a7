//! Order Model

use serde::{Deserialize, Serialize};

use super::cart::CartLine;
use crate::order::OrderStatus;

/// Fallback label when an item's menu name cannot be resolved
pub const UNKNOWN_MENU_NAME: &str = "Menu tidak dikenal";

/// Order header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub customer_name: String,
    pub table_id: String,
    /// Subtotal plus payment fee, fixed at submission
    pub total_price: i64,
    /// Payment method label (e.g. "Gopay")
    pub payment_method: String,
    pub status: OrderStatus,
    /// Unix millis
    pub created_at: i64,
    pub updated_at: i64,
}

/// Order line, immutable once written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// `None` once the menu item has been deleted
    pub menu_id: Option<i64>,
    /// Name at order time
    pub name: String,
    pub quantity: i64,
    pub price_at_order: i64,
    pub note: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> i64 {
        self.price_at_order * self.quantity
    }
}

/// Order with its items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    pub fn items_subtotal(&self) -> i64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// Submit order request (customer checkout)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSubmission {
    pub customer_name: String,
    pub table_id: String,
    /// Payment method id (e.g. "gopay")
    pub payment_method: String,
    pub items: Vec<CartLine>,
}

/// Status change request
///
/// `from` is the status the operator saw; the update is rejected with a
/// conflict if the stored status differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub from: OrderStatus,
    pub to: OrderStatus,
}
