//! expenses-server: HTTP service for expense records
//!
//! Create, read, update and list expenses stored in a Postgres table.
//! The `db` layer owns the single shared connection handle; the `http`
//! layer binds, validates and maps storage outcomes to status codes.

pub mod db;
pub mod http;
pub mod models;

pub use db::{ensure_table, ConnectionManager, PoolConfig};
pub use http::{run_server, ServerConfig, ServerError};
