//! Error types for the HTTP surface and the server process.
//!
//! [`AppError`] maps handler failures onto HTTP responses with a
//! `{"error": ..., "status": ...}` body. [`ServerError`] covers startup and
//! shutdown failures and carries the process exit code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use coinclock_core::{CatalogError, ConfigError, RepositoryError, ValidationError};
use coinclock_warehouse::WarehouseError;
use serde_json::json;
use thiserror::Error;

/// Handler error with HTTP response mapping.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Invalid request data (400).
    #[error("{0}")]
    BadRequest(String),
}

impl AppError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound { .. } => Self::NotFound(error.to_string()),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = axum::Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Startup and shutdown failures, mapped to exit codes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open coin store: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("failed to load seed catalog: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    #[error("refresh daemon failed: {0}")]
    Daemon(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Warehouse(_) | Self::Repository(_) => 3,
            Self::Logging(_) => 4,
            Self::Daemon(_) => 5,
            Self::Io(_) => 10,
        }
    }
}
