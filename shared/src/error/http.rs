//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound | Self::OrderNotFound | Self::MenuItemNotFound => StatusCode::NOT_FOUND,

            Self::AlreadyExists | Self::OrderAlreadyCompleted | Self::OrderStatusConflict => {
                StatusCode::CONFLICT
            }

            // Business rule rejections
            Self::OrderInvalidTransition | Self::MenuItemUnavailable => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::ClientDisconnected
            | Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}
