//! Command implementations for the expenses CLI

pub mod migrate;
pub mod serve;

use std::time::Duration;

use clap::Args;
use expenses_server::PoolConfig;

pub use migrate::run_migrate;
pub use serve::run_serve;

/// Database connection arguments shared by every command
#[derive(Args, Debug)]
pub struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Maximum pooled connections behind the shared handle
    #[arg(long, default_value = "5")]
    pub max_connections: u32,

    /// Seconds to wait for a database connection
    #[arg(long, default_value = "5")]
    pub connect_timeout: u64,
}

impl DatabaseArgs {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            database_url: self.database_url.clone(),
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.connect_timeout),
        }
    }
}
