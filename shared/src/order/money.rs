//! Order total arithmetic
//!
//! All amounts are `i64` in the smallest currency unit.

use serde::{Deserialize, Serialize};

use crate::models::{CartLine, PaymentMethod};

/// Price breakdown computed once at submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub fee: i64,
    pub total: i64,
}

pub fn line_total(price: i64, quantity: u32) -> i64 {
    price * i64::from(quantity)
}

/// Sum of `price * quantity` over the lines
pub fn subtotal(lines: &[CartLine]) -> i64 {
    lines.iter().map(CartLine::line_total).sum()
}

/// Sum of quantities
pub fn total_items(lines: &[CartLine]) -> u32 {
    lines.iter().map(|l| l.quantity).sum()
}

pub fn order_totals(lines: &[CartLine], method: &PaymentMethod) -> OrderTotals {
    let subtotal = subtotal(lines);
    OrderTotals {
        subtotal,
        fee: method.fee,
        total: subtotal + method.fee,
    }
}
