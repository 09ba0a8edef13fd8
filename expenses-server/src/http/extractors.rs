//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::Deserialize;

use super::error::ApiError;
use crate::models::ExpenseDraft;

/// Extract an expense id from path.
///
/// Non-integers are rejected with `InvalidId`. Integers that cannot be a
/// stored id are rejected with `NotFound` so storage is never queried.
pub struct ExpenseId(pub i32);

impl<S> FromRequestParts<S> for ExpenseId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::InvalidId)?;

        let id: i64 = raw.parse().map_err(|_| ApiError::InvalidId)?;
        let id = i32::try_from(id).map_err(|_| ApiError::NotFound)?;

        Ok(Self(id))
    }
}

/// Request body shape for create and update.
///
/// Missing fields fall back to empty values so they fail validation instead
/// of deserialization. Unknown fields (including `id`) are ignored.
#[derive(Debug, Deserialize)]
pub struct ExpensePayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Extract a JSON body and validate it into an `ExpenseDraft`
pub struct ValidExpense(pub ExpenseDraft);

impl<S> FromRequest<S> for ValidExpense
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<ExpensePayload> = Json::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(%rejection, "Rejected expense body");
                ApiError::InvalidBody
            })?;

        let draft = ExpenseDraft::new(payload.title, payload.amount, payload.note, payload.tags)
            .map_err(|e| {
                tracing::debug!(error = %e, "Expense body failed validation");
                ApiError::InvalidBody
            })?;

        Ok(Self(draft))
    }
}
