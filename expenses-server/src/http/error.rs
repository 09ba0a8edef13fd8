//! API error types with IntoResponse
//!
//! Every failure is rendered as `{"message": "..."}`. Storage failures other
//! than a missing row are logged and reported with a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::repos::DbError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Path id is not an integer (400)
    InvalidId,

    /// Body failed to bind or validate (400)
    InvalidBody,

    /// No expense with that id (400, kept for client compatibility)
    NotFound,

    /// Anything else from storage (500, logged)
    Internal(DbError),

    /// Request never produced a response: deadline hit or handler panicked (500, logged)
    Aborted { reason: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId | Self::InvalidBody | Self::NotFound => StatusCode::BAD_REQUEST,
            Self::Internal(_) | Self::Aborted { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidId => "ID is not numeric",
            Self::InvalidBody => "Invalid request body",
            Self::NotFound => "Expense not found",
            Self::Internal(_) | Self::Aborted { .. } => "Internal error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log the actual error, return generic message
        match &self {
            Self::Internal(e) => tracing::error!("Database error: {}", e),
            Self::Aborted { reason } => tracing::error!("Request aborted: {}", reason),
            _ => {}
        }

        let body = json!({ "message": self.message() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { .. } => Self::NotFound,
            _ => Self::Internal(e),
        }
    }
}
