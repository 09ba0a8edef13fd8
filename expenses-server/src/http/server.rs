//! Axum server setup
//!
//! Server skeleton with:
//! - Authorization check on expense routes
//! - Tracing middleware and a per-request deadline
//! - Handler panics rendered as 500s instead of killing the process
//! - Graceful shutdown on SIGTERM/Ctrl+C, then the database handle is closed

use std::any::Any;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::response::{IntoResponse, Response};
use axum::{middleware, BoxError, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::{auth, routes};
use crate::db::{ConnectionManager, DbError, ExpenseStore, PgExpenseStore};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:2565)
    pub bind_addr: SocketAddr,

    /// Expected `Authorization` header value. `None` disables the check.
    pub auth_token: Option<String>,

    /// Deadline for a single request, including its database call.
    /// Keep it above the pool's acquire timeout so storage failures
    /// are reported as such.
    pub request_timeout: Duration,

    /// How long in-flight requests may drain after a shutdown signal
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 2565)),
            auth_token: None,
            request_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn ExpenseStore>,
    pub auth_token: Option<String>,
}

/// Build the application router.
///
/// Expense routes sit behind the authorization check; `/health` does not.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let expenses = routes::expenses::router().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::require_authorization,
    ));

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .layer(TimeoutLayer::new(config.request_timeout));

    Router::new()
        .merge(routes::health::router())
        .merge(expenses)
        .layer(middleware)
        .with_state(state)
}

/// Render a request that hit the deadline (or another layer failure).
async fn handle_middleware_error(err: BoxError) -> ApiError {
    let reason = if err.is::<Elapsed>() {
        "request deadline elapsed".to_owned()
    } else {
        err.to_string()
    };
    ApiError::Aborted { reason }
}

/// Render a panicking handler like any other internal failure.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic payload".to_owned()
    };

    ApiError::Aborted {
        reason: format!("handler panicked: {}", detail),
    }
    .into_response()
}

/// Run the HTTP server until a shutdown signal, then close the database.
///
/// The connection manager should already have been acquired once and the
/// schema ensured; see `expenses_server::db::ensure_table`.
///
/// # Example
///
/// ```ignore
/// let manager = Arc::new(ConnectionManager::new(PoolConfig::new(database_url)));
/// ensure_table(&manager.acquire().await?).await?;
/// run_server(manager, ServerConfig::default()).await?;
/// ```
pub async fn run_server(
    manager: Arc<ConnectionManager>,
    config: ServerConfig,
) -> Result<(), ServerError> {
    if config.auth_token.is_none() {
        tracing::warn!("No auth token configured - authorization check disabled");
    }

    let state = Arc::new(AppState {
        store: Arc::new(PgExpenseStore::new(manager.clone())),
        auth_token: config.auth_token.clone(),
    });
    let app = build_router(state, &config);

    let served = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => {
            tracing::info!("Server listening on {}", config.bind_addr);
            serve_until(listener, app, shutdown_signal(), config.shutdown_grace).await
        }
        Err(e) => Err(e.into()),
    };

    // Close the handle even if binding or serving failed
    let closed = manager.close().await;
    served?;
    closed?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Serve until `signal` resolves, then give in-flight requests `grace` to finish.
async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    grace: Duration,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (signalled_tx, mut signalled_rx) = watch::channel(false);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            let _ = signalled_tx.send(true);
        })
        .into_future();

    let drain_deadline = async move {
        if signalled_rx.wait_for(|signalled| *signalled).await.is_err() {
            // Sender dropped without a signal: the server already stopped
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "Shutdown grace period elapsed, dropping open connections"
            );
        }
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DbError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::db::store::memory::MemoryStore;
    use crate::db::PoolConfig;

    const TOKEN: &str = "November 10, 2009";

    fn app(auth_token: Option<&str>) -> Router {
        let state = Arc::new(AppState {
            store: Arc::new(MemoryStore::default()),
            auth_token: auth_token.map(str::to_owned),
        });
        build_router(state, &ServerConfig::default())
    }

    fn list_request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/expenses");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 2565);
        assert!(config.auth_token.is_none());
        assert_eq!(config.shutdown_grace, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn matching_token_is_authorized() {
        let response = app(Some(TOKEN))
            .oneshot(list_request(Some(TOKEN)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wrong_or_missing_token_is_401() {
        for authorization in [Some("HELLO"), None] {
            let response = app(Some(TOKEN))
                .oneshot(list_request(authorization))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&bytes[..], br#""""#);
        }
    }

    #[tokio::test]
    async fn no_token_configured_allows_all() {
        let response = app(None).oneshot(list_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_bypasses_authorization() {
        let response = app(Some(TOKEN))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = app(None)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    async fn assert_internal_error(app: Router) {
        let response = app.oneshot(list_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"message":"Internal error"}"#);
    }

    #[tokio::test]
    async fn unreachable_database_is_500_before_request_deadline() {
        let manager = Arc::new(ConnectionManager::new(PoolConfig::new(
            "postgres://u:p@127.0.0.1:1/x",
        )));
        let state = Arc::new(AppState {
            store: Arc::new(PgExpenseStore::new(manager)),
            auth_token: None,
        });

        assert_internal_error(build_router(state, &ServerConfig::default())).await;
    }

    #[tokio::test]
    async fn request_deadline_is_500_with_message() {
        let state = Arc::new(AppState {
            store: Arc::new(MemoryStore::hanging()),
            auth_token: None,
        });
        let config = ServerConfig {
            request_timeout: Duration::from_millis(50),
            ..ServerConfig::default()
        };

        assert_internal_error(build_router(state, &config)).await;
    }

    #[tokio::test]
    async fn panicking_handler_is_500_and_server_keeps_serving() {
        let state = Arc::new(AppState {
            store: Arc::new(MemoryStore::panicking()),
            auth_token: Some(TOKEN.to_owned()),
        });
        let app = build_router(state, &ServerConfig::default());

        let response = app.clone().oneshot(list_request(Some(TOKEN))).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], br#"{"message":"Internal error"}"#);

        // Same router, next request is still answered
        let response = app.oneshot(list_request(Some("HELLO"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn serve_until_stops_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let result = serve_until(listener, app(None), async {}, Duration::from_secs(1)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn bind_failure_still_closes_handle() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let manager = Arc::new(ConnectionManager::new(PoolConfig::new(url)));
        manager.acquire().await.expect("acquire failed");

        // Hold the port so the server cannot bind it
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ServerConfig {
            bind_addr: occupied.local_addr().unwrap(),
            ..ServerConfig::default()
        };

        let result = run_server(manager.clone(), config).await;
        assert!(matches!(result, Err(ServerError::Io(_))));
        assert!(!manager.is_open().await);
    }
}
