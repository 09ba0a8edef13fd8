//! Authorization header check
//!
//! Requests must carry an `Authorization` header equal to the configured
//! token. Rejections never reach a handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::server::AppState;

/// Reject with 401 unless the header matches the configured token.
///
/// With no token configured every request passes.
pub async fn require_authorization(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(req).await;
    };

    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if !authorized {
        tracing::debug!(method = %req.method(), uri = %req.uri(), "Unauthorized request");
        return (StatusCode::UNAUTHORIZED, Json("")).into_response();
    }

    next.run(req).await
}
