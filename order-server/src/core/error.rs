use thiserror::Error;

/// Startup and runtime failures of the server process
///
/// Request-level failures use [`crate::utils::AppError`] instead.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<shared::AppError> for ServerError {
    fn from(err: shared::AppError) -> Self {
        match err.code {
            shared::ErrorCode::DatabaseError => ServerError::Database(err.message),
            shared::ErrorCode::ConfigError => ServerError::Config(err.message),
            _ => ServerError::Internal(anyhow::anyhow!(err.message)),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
