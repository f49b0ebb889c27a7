//! Utilities
//!
//! - [`AppError`] / [`AppResult`]: unified error types (from shared::error)
//! - [`logger`]: tracing subscriber setup
//! - [`time`]: business time zone helpers
//! - [`validation`]: input checks for handlers and services

pub mod logger;
pub mod time;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
