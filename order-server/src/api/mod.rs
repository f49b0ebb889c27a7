//! HTTP API modules
//!
//! - [`health`] - liveness and component checks
//! - [`menus`] - menu catalog management
//! - [`payment_methods`] - payment method catalog
//! - [`orders`] - checkout, kitchen list and status transitions
//! - [`statistics`] - dashboard aggregates

pub mod health;
pub mod menus;
pub mod orders;
pub mod payment_methods;
pub mod statistics;
