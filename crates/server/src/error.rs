//! Unified error handling for the API.
//!
//! Every error renders as JSON: `{"errors": {...}}` for field validation,
//! `{"error": "..."}` otherwise.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::PostalLookupError;
use crate::validation::FieldErrors;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// One or more fields failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] FieldErrors),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Postal-code lookup failed.
    #[error(transparent)]
    PostalLookup(#[from] PostalLookupError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A storage constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed request (body, path or query).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound("resource".to_owned()),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            RepositoryError::MissingReference(_) => {
                Self::BadRequest("referenced record does not exist".to_owned())
            }
            RepositoryError::Database(_) => Self::Database(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PostalLookup(e) => match e {
                PostalLookupError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                PostalLookupError::NotFound => StatusCode::NOT_FOUND,
                PostalLookupError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                PostalLookupError::Upstream(_) => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::PostalLookup(PostalLookupError::Upstream(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = match self {
            Self::Validation(errors) => json!({ "errors": errors }),
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => json!({ "error": "Internal server error" }),
            Self::PostalLookup(PostalLookupError::Upstream(_)) => {
                json!({ "error": "postal code service unavailable" })
            }
            Self::PostalLookup(e) => json!({ "error": e.to_string() }),
            Self::NotFound(what) => json!({ "error": format!("{what} not found") }),
            Self::Conflict(message) | Self::BadRequest(message) => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
