//! Error value and the HTTP response envelope

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::codes::ErrorCode;

/// Structured details attached to an error, serialized in key order
pub type ErrorDetails = BTreeMap<String, Value>;

/// Business error: stable code, readable message, optional details
///
/// Details carry machine-readable context such as the offending field or
/// the expected and actual status of a conflicting update.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<ErrorDetails>,
}

impl AppError {
    /// Error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref()?.get(key)
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InvalidRequest, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::AlreadyExists, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, msg)
    }

    pub fn client_disconnected() -> Self {
        Self::new(ErrorCode::ClientDisconnected)
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Envelope returned by every HTTP endpoint
///
/// ```json
/// { "code": 0, "message": "OK", "data": { ... } }
/// { "code": 4008, "message": "...", "details": { "expected": "pending", "actual": "cooking" } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: Some(ErrorCode::Success.code()),
            message: "OK".to_string(),
            data: Some(data),
            details: None,
        }
    }

    /// Split into the payload or the error the server reported
    ///
    /// Unrecognized codes become [`ErrorCode::Unknown`] with the server's
    /// message preserved.
    pub fn into_result(self) -> Result<Option<T>, AppError> {
        match self.code {
            None | Some(0) => Ok(self.data),
            Some(raw) => Err(AppError {
                code: ErrorCode::try_from(raw).unwrap_or(ErrorCode::Unknown),
                message: self.message,
                details: self.details,
            }),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(err: AppError) -> Self {
        Self {
            code: Some(err.code.code()),
            message: err.message,
            data: None,
            details: err.details,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category().is_server_fault() {
            tracing::error!(code = %self.code, message = %self.message, "System error");
        }
        let status = self.http_status();
        (status, axum::Json(ApiResponse::<()>::from(self))).into_response()
    }
}
