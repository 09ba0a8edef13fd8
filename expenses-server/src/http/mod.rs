//! HTTP server layer
//!
//! Axum server with:
//! - Authorization header check
//! - Request tracing and deadlines
//! - Graceful shutdown
//! - JSON error responses

pub mod server;
pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;

pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
pub use error::ApiError;
