//! Unified error codes for the table-ordering system
//!
//! These codes travel over the HTTP API and are understood by both
//! order-server and table-client. Ranges:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Menu errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16` so API consumers can match on numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been completed
    OrderAlreadyCompleted = 4003,
    /// Order is empty
    OrderEmpty = 4007,
    /// Order status changed since it was read
    OrderStatusConflict = 4008,
    /// Status transition is not allowed
    OrderInvalidTransition = 4009,
    /// Customer name is required
    CustomerNameRequired = 4010,
    /// Table identifier is required
    TableRequired = 4011,

    // ==================== 5xxx: Payment ====================
    /// Invalid payment method
    PaymentInvalidMethod = 5003,

    // ==================== 6xxx: Menu ====================
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item price is invalid
    MenuItemInvalidPrice = 6002,
    /// Menu item is not available
    MenuItemUnavailable = 6003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
    /// Message bus client disconnected
    ClientDisconnected = 9301,
}

impl ErrorCode {
    /// Numeric value of the code
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Default English message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::InvalidFormat => "Invalid format",
            Self::RequiredField => "Required field missing",
            Self::ValueOutOfRange => "Value out of range",

            Self::OrderNotFound => "Order not found",
            Self::OrderAlreadyCompleted => "Order has already been completed",
            Self::OrderEmpty => "Order has no items",
            Self::OrderStatusConflict => "Order status was changed by someone else",
            Self::OrderInvalidTransition => "Order status transition not allowed",
            Self::CustomerNameRequired => "Customer name is required",
            Self::TableRequired => "Table identifier is required",

            Self::PaymentInvalidMethod => "Invalid payment method",

            Self::MenuItemNotFound => "Menu item not found",
            Self::MenuItemInvalidPrice => "Menu item price is invalid",
            Self::MenuItemUnavailable => "Menu item is not available",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
            Self::ClientDisconnected => "Client disconnected",
        }
    }
}

/// Returned when a numeric code does not map to any [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            4001 => Ok(ErrorCode::OrderNotFound),
            4003 => Ok(ErrorCode::OrderAlreadyCompleted),
            4007 => Ok(ErrorCode::OrderEmpty),
            4008 => Ok(ErrorCode::OrderStatusConflict),
            4009 => Ok(ErrorCode::OrderInvalidTransition),
            4010 => Ok(ErrorCode::CustomerNameRequired),
            4011 => Ok(ErrorCode::TableRequired),

            5003 => Ok(ErrorCode::PaymentInvalidMethod),

            6001 => Ok(ErrorCode::MenuItemNotFound),
            6002 => Ok(ErrorCode::MenuItemInvalidPrice),
            6003 => Ok(ErrorCode::MenuItemUnavailable),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),
            9301 => Ok(ErrorCode::ClientDisconnected),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderEmpty.code(), 4007);
        assert_eq!(ErrorCode::OrderStatusConflict.code(), 4008);
        assert_eq!(ErrorCode::PaymentInvalidMethod.code(), 5003);
        assert_eq!(ErrorCode::MenuItemUnavailable.code(), 6003);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(4009), Ok(ErrorCode::OrderInvalidTransition));
        assert_eq!(ErrorCode::try_from(6001), Ok(ErrorCode::MenuItemNotFound));
        assert_eq!(ErrorCode::try_from(9301), Ok(ErrorCode::ClientDisconnected));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(1001), Err(InvalidErrorCode(1001)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::OrderStatusConflict).unwrap();
        assert_eq!(json, "4008");

        let code: ErrorCode = serde_json::from_str("4007").unwrap();
        assert_eq!(code, ErrorCode::OrderEmpty);

        let result: Result<ErrorCode, _> = serde_json::from_str("10000");
        assert!(result.is_err());
    }

    #[test]
    fn test_display_and_message() {
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(
            format!("{}", InvalidErrorCode(42)),
            "invalid error code: 42"
        );
    }
}
