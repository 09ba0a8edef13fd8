//! Storage seam used by the HTTP handlers
//!
//! Handlers only see `ExpenseStore`. The Postgres implementation goes through
//! the connection manager on every call, so each request gets a pinged
//! (and if needed reopened) handle.

use std::sync::Arc;

use async_trait::async_trait;

use super::pool::ConnectionManager;
use super::repos::{DbError, Expense, ExpenseRepo};
use crate::models::ExpenseDraft;

/// Expense persistence operations
#[async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Insert and return the stored expense with its new id.
    async fn insert(&self, draft: ExpenseDraft) -> Result<Expense, DbError>;

    async fn get(&self, id: i32) -> Result<Expense, DbError>;

    /// Overwrite all fields of `id`. `DbError::NotFound` if absent.
    async fn update(&self, id: i32, draft: ExpenseDraft) -> Result<Expense, DbError>;

    async fn list(&self) -> Result<Vec<Expense>, DbError>;

    /// Check that storage is reachable.
    async fn ping(&self) -> Result<(), DbError>;
}

/// Postgres-backed store
pub struct PgExpenseStore {
    manager: Arc<ConnectionManager>,
}

impl PgExpenseStore {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl ExpenseStore for PgExpenseStore {
    async fn insert(&self, draft: ExpenseDraft) -> Result<Expense, DbError> {
        let pool = self.manager.acquire().await?;
        let expense = ExpenseRepo::new(&pool).insert(draft).await?;
        tracing::debug!(id = expense.id, "Inserted expense");
        Ok(expense)
    }

    async fn get(&self, id: i32) -> Result<Expense, DbError> {
        let pool = self.manager.acquire().await?;
        ExpenseRepo::new(&pool).get(id).await
    }

    async fn update(&self, id: i32, draft: ExpenseDraft) -> Result<Expense, DbError> {
        let pool = self.manager.acquire().await?;
        let expense = ExpenseRepo::new(&pool).update(id, draft).await?;
        tracing::debug!(id, "Updated expense");
        Ok(expense)
    }

    async fn list(&self) -> Result<Vec<Expense>, DbError> {
        let pool = self.manager.acquire().await?;
        ExpenseRepo::new(&pool).list().await
    }

    async fn ping(&self) -> Result<(), DbError> {
        self.manager.acquire().await.map(|_| ())
    }
}
