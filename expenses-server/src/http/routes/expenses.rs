//! Expense endpoints
//!
//! Path id is parsed before the body, and both before storage is touched.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::db::repos::Expense;
use crate::http::error::ApiError;
use crate::http::extractors::{ExpenseId, ValidExpense};
use crate::http::server::AppState;

/// POST /expenses - create an expense
async fn create_expense(
    State(state): State<Arc<AppState>>,
    ValidExpense(draft): ValidExpense,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = state.store.insert(draft).await?;
    tracing::info!(id = expense.id, "Created expense");

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /expenses/{id} - get a single expense
async fn get_expense(
    State(state): State<Arc<AppState>>,
    ExpenseId(id): ExpenseId,
) -> Result<Json<Expense>, ApiError> {
    let expense = state.store.get(id).await?;
    Ok(Json(expense))
}

/// PUT /expenses/{id} - overwrite an expense
async fn update_expense(
    State(state): State<Arc<AppState>>,
    ExpenseId(id): ExpenseId,
    ValidExpense(draft): ValidExpense,
) -> Result<Json<Expense>, ApiError> {
    let expense = state.store.update(id, draft).await?;
    tracing::info!(id, "Updated expense");

    Ok(Json(expense))
}

/// GET /expenses - list all expenses
async fn list_expenses(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = state.store.list().await?;
    Ok(Json(expenses))
}

/// Expense routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/{id}", get(get_expense).put(update_expense))
}
