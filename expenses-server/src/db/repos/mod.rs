//! Repository implementations for database access
//!
//! Each repository maps one operation to one parameterized statement and
//! decides `NotFound` itself from an absent row.

pub mod expenses;

pub use expenses::{DbError, Expense, ExpenseRepo};
