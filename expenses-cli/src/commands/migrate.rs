//! Create the expenses table and exit

use anyhow::{Context, Result};
use clap::Parser;

use expenses_server::{ensure_table, ConnectionManager};

use super::DatabaseArgs;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub db: DatabaseArgs,
}

/// Ensure the schema exists, then close the connection
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let manager = ConnectionManager::new(args.db.pool_config());

    let pool = manager
        .acquire()
        .await
        .context("Failed to connect to database")?;
    ensure_table(&pool)
        .await
        .context("Failed to create expenses table")?;

    manager.close().await.context("Failed to close database")?;
    tracing::info!("Schema is up to date");
    Ok(())
}
