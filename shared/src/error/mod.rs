//! Unified error system
//!
//! - [`ErrorCode`]: standardized numeric codes
//! - [`ErrorCategory`]: classification by code range
//! - [`AppError`]: code + message + optional details
//! - [`ApiResponse`]: envelope used by every HTTP endpoint
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::new(ErrorCode::OrderEmpty);
//! let err = AppError::validation("Customer name is blank").with_detail("field", "customer_name");
//! let response: ApiResponse<()> = err.into();
//! assert_eq!(response.code, Some(2));
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult, ErrorDetails};
