//! Database layer - connection manager, schema and repositories
//!
//! - One shared handle, lazily opened, pinged on every acquire
//! - One parameterized statement per operation
//! - `NotFound` decided at the repository, from an absent row

pub mod pool;
pub mod repos;
pub mod schema;
pub mod store;

pub use pool::{ConnectionManager, PoolConfig};
pub use repos::*;
pub use schema::ensure_table;
pub use store::{ExpenseStore, PgExpenseStore};
