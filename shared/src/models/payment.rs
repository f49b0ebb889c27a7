//! Payment method catalog
//!
//! Payment methods only select a fixed fee added on top of the subtotal.
//! No money moves through the system.

use serde::{Deserialize, Serialize};

/// Selectable payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaymentMethod {
    /// Stable identifier sent by clients (e.g. "gopay")
    pub id: &'static str,
    /// Label stored on the order
    pub name: &'static str,
    /// Fee in the smallest currency unit
    pub fee: i64,
}

pub const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod {
        id: "gopay",
        name: "Gopay",
        fee: 1000,
    },
    PaymentMethod {
        id: "qris",
        name: "QRIS",
        fee: 0,
    },
    PaymentMethod {
        id: "va",
        name: "Virtual Account",
        fee: 4000,
    },
    PaymentMethod {
        id: "transfer",
        name: "Transfer Bank",
        fee: 2500,
    },
];

/// Method preselected on the payment screen
pub const DEFAULT_PAYMENT_METHOD: &str = "gopay";

impl PaymentMethod {
    pub fn find(id: &str) -> Option<&'static PaymentMethod> {
        PAYMENT_METHODS.iter().find(|m| m.id == id)
    }

    pub fn all() -> &'static [PaymentMethod] {
        PAYMENT_METHODS
    }
}

/// Owned view of a payment method for API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodInfo {
    pub id: String,
    pub name: String,
    pub fee: i64,
}

impl From<&PaymentMethod> for PaymentMethodInfo {
    fn from(m: &PaymentMethod) -> Self {
        Self {
            id: m.id.to_string(),
            name: m.name.to_string(),
            fee: m.fee,
        }
    }
}
