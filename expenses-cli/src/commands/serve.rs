//! HTTP server command
//!
//! Connects, ensures the schema, then serves until SIGTERM/Ctrl+C.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use expenses_server::{ensure_table, run_server, ConnectionManager, ServerConfig};

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on (`2565` or `:2565`)
    #[arg(long, short = 'p', env = "PORT", default_value = "2565", value_parser = parse_port)]
    pub port: u16,

    /// Required `Authorization` header value; unset disables the check
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Seconds to let in-flight requests finish after a shutdown signal
    #[arg(long, default_value = "10")]
    pub shutdown_grace: u64,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Accept a bare port or the `:port` listen form.
fn parse_port(s: &str) -> Result<u16, String> {
    let digits = s.strip_prefix(':').unwrap_or(s);
    digits
        .parse()
        .map_err(|_| format!("invalid port '{}'", s))
}

/// A database wait must end before the request deadline, or clients see a
/// timed-out request instead of the storage error.
fn check_timeouts(connect_secs: u64, request_secs: u64) -> Result<()> {
    if connect_secs >= request_secs {
        bail!(
            "--connect-timeout ({}s) must be shorter than --timeout ({}s)",
            connect_secs,
            request_secs
        );
    }
    Ok(())
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    check_timeouts(args.db.connect_timeout, args.timeout)?;

    let bind_addr = SocketAddr::new(args.host, args.port);
    tracing::info!("Starting expenses server on {}", bind_addr);

    let manager = Arc::new(ConnectionManager::new(args.db.pool_config()));

    // Cannot serve without a connection and the table
    let pool = manager
        .acquire()
        .await
        .context("Failed to connect to database")?;
    ensure_table(&pool)
        .await
        .context("Failed to create expenses table")?;

    let config = ServerConfig {
        bind_addr,
        auth_token: args.auth_token,
        request_timeout: Duration::from_secs(args.timeout),
        shutdown_grace: Duration::from_secs(args.shutdown_grace),
    };

    // Run server (blocks until shutdown)
    run_server(manager, config).await.context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_accepts_colon_form() {
        assert_eq!(parse_port("2565"), Ok(2565));
        assert_eq!(parse_port(":2565"), Ok(2565));
        assert!(parse_port("abc").is_err());
        assert!(parse_port(":").is_err());
        assert!(parse_port("70000").is_err());
    }

    #[test]
    fn serve_args_from_flags() {
        let args = ServeArgs::try_parse_from([
            "serve",
            "--port",
            ":8080",
            "--database-url",
            "postgres://localhost/expenses",
            "--auth-token",
            "November 10, 2009",
        ])
        .unwrap();

        assert_eq!(args.port, 8080);
        assert_eq!(args.auth_token.as_deref(), Some("November 10, 2009"));
        assert_eq!(args.db.pool_config().max_connections, 5);
        assert_eq!(args.db.pool_config().acquire_timeout, Duration::from_secs(5));
        assert!(check_timeouts(args.db.connect_timeout, args.timeout).is_ok());
    }

    #[test]
    fn connect_timeout_must_undercut_request_timeout() {
        assert!(check_timeouts(5, 30).is_ok());
        assert!(check_timeouts(30, 30).is_err());
        assert!(check_timeouts(60, 30).is_err());
    }
}
