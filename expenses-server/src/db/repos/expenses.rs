//! Expense repository
//!
//! One parameterized statement per operation. A missing row is reported as
//! `DbError::NotFound` here, so callers never inspect driver error text.

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::models::ExpenseDraft;

const RESOURCE: &str = "expense";

/// Expense record from database
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Expense {
    pub id: i32,
    pub title: String,
    pub amount: f64,
    pub note: String,
    pub tags: Vec<String>,
}

impl Expense {
    /// Combine a storage-assigned id with validated fields.
    pub fn from_draft(id: i32, draft: ExpenseDraft) -> Self {
        let (title, amount, note, tags) = draft.into_parts();
        Self {
            id,
            title,
            amount,
            note,
            tags,
        }
    }
}

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: i64 },

    #[error("database connection is not open")]
    NotConnected,
}

impl DbError {
    pub(crate) fn expense_not_found(id: i64) -> Self {
        Self::NotFound {
            resource: RESOURCE,
            id,
        }
    }
}

/// Expense repository
pub struct ExpenseRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ExpenseRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new expense and return it with the id assigned by storage.
    pub async fn insert(&self, draft: ExpenseDraft) -> Result<Expense, DbError> {
        let (title, amount, note, tags) = draft.into_parts();

        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (title, amount, note, tags)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, amount, note, tags
            "#,
        )
        .bind(title)
        .bind(amount)
        .bind(note)
        .bind(tags)
        .fetch_one(self.pool)
        .await?;

        Ok(expense)
    }

    /// Get a single expense by id.
    pub async fn get(&self, id: i32) -> Result<Expense, DbError> {
        sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, title, amount, note, tags
            FROM expenses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::expense_not_found(id.into()))
    }

    /// Overwrite every mutable field of an existing expense.
    pub async fn update(&self, id: i32, draft: ExpenseDraft) -> Result<Expense, DbError> {
        let (title, amount, note, tags) = draft.into_parts();

        sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses
            SET title = $2, amount = $3, note = $4, tags = $5
            WHERE id = $1
            RETURNING id, title, amount, note, tags
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(amount)
        .bind(note)
        .bind(tags)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::expense_not_found(id.into()))
    }

    /// List every expense, oldest first. An empty table yields an empty list.
    pub async fn list(&self) -> Result<Vec<Expense>, DbError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, title, amount, note, tags
            FROM expenses
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(expenses)
    }
}
