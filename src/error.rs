//! Unified error handling.
//!
//! Services return `Result<T, AppError>`; the `IntoResponse` impl is the single place
//! where error kinds become HTTP status codes and `{"errors": ...}` bodies.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{models::ErrorResponse, repository::RepositoryError, validation::ValidationError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Client input failed a schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Client request is well-formed but cannot be honoured (e.g. duplicate username).
    #[error("{0}")]
    BadRequest(String),

    /// Missing, invalid or revoked credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Resource does not exist or is not owned by the caller. The two cases are
    /// indistinguishable to the client.
    #[error("{0}")]
    NotFound(String),

    /// Store failure, propagated unmodified from the repository.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Server-side failure outside the store (hashing, token signing).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Repository(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            Self::Repository(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                // Don't expose internal error details to clients.
                ErrorResponse {
                    errors: "Internal server error".to_string(),
                    fields: None,
                }
            }
            Self::Validation(err) => ErrorResponse {
                errors: err.to_string(),
                fields: Some(err.fields),
            },
            other => ErrorResponse {
                errors: other.to_string(),
                fields: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
