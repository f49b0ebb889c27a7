//! Client error types

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::message::MessageError;

/// Client error type
///
/// Every user action surfaces at most one of these; nothing is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was sent
    #[error("Validation error: {0}")]
    Validation(AppError),

    /// Server answered with an error body
    #[error("Server rejected request: {0}")]
    Api(AppError),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Session storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Message bus failure
    #[error("Message error: {0}")]
    Message(#[from] MessageError),
}

impl ClientError {
    /// Business error code, when the failure carries one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Validation(e) | Self::Api(e) => Some(e.code),
            _ => None,
        }
    }

    pub(crate) fn validation(code: ErrorCode) -> Self {
        Self::Validation(AppError::new(code))
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
