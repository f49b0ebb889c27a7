//! Cart line and checkout summary
//!
//! A cart line snapshots name and price when the item is first added, so the
//! order total is computed from what the customer saw.

use serde::{Deserialize, Serialize};

use super::menu::MenuItem;

/// One line of the customer's cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub menu_id: i64,
    pub name: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Always >= 1
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CartLine {
    /// New line with quantity 1 for the given menu item
    pub fn from_menu_item(item: &MenuItem) -> Self {
        Self {
            menu_id: item.id,
            name: item.name.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            quantity: 1,
            note: None,
        }
    }

    pub fn line_total(&self) -> i64 {
        crate::order::line_total(self.price, self.quantity)
    }
}

/// Stored after a successful submission for the confirmation screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub order_id: i64,
    pub table_id: String,
    pub customer_name: String,
    pub total: i64,
    /// Payment method label (e.g. "Gopay")
    pub method: String,
    pub items: Vec<CartLine>,
    /// Unix millis
    pub submitted_at: i64,
}
