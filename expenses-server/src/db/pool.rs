//! Database connection management
//!
//! A single shared `PgPool` handle, opened lazily on first `acquire()` and
//! re-validated with a ping on every later one. A failed ping reopens the
//! handle once before the error is surfaced.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool};
use tokio::sync::RwLock;

use super::repos::DbError;

/// Default maximum connections for the pool.
/// Kept low: one logical handle per process.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default time to wait for a connection before giving up.
/// Must stay well under the HTTP request deadline so an unreachable
/// database surfaces as a storage error, not a timed-out request.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the shared handle
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

/// The open handle, if any, and how many times a handle has been opened.
///
/// `generation` survives `close()` so a task holding an old generation can
/// never mistake a fresh handle for the stale one it saw.
#[derive(Default)]
struct Slot {
    generation: u64,
    pool: Option<PgPool>,
}

/// Owns the process-wide database handle.
///
/// Construct once at startup and share behind an `Arc`. Nothing connects
/// until the first [`ConnectionManager::acquire`].
pub struct ConnectionManager {
    config: PoolConfig,
    slot: RwLock<Slot>,
}

impl ConnectionManager {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            slot: RwLock::new(Slot::default()),
        }
    }

    /// Return a live handle, opening or reopening it as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the first open fails, or if the handle fails its
    /// ping and a single reopen attempt also fails.
    pub async fn acquire(&self) -> Result<PgPool, DbError> {
        let (generation, current) = {
            let guard = self.slot.read().await;
            (guard.generation, guard.pool.clone())
        };

        match current {
            None => self.open_if_empty().await,
            Some(pool) => match ping(&pool).await {
                Ok(()) => Ok(pool),
                Err(e) => {
                    tracing::warn!(error = %e, "Database ping failed, reconnecting");
                    self.reopen(generation).await
                }
            },
        }
    }

    /// Close the handle. A later `acquire()` opens a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::NotConnected`] if no handle is open.
    pub async fn close(&self) -> Result<(), DbError> {
        let pool = self.slot.write().await.pool.take().ok_or(DbError::NotConnected)?;
        pool.close().await;
        tracing::info!("Database connection closed");
        Ok(())
    }

    /// Whether a handle is currently held (it may still be stale).
    #[cfg(test)]
    pub(crate) async fn is_open(&self) -> bool {
        self.slot.read().await.pool.is_some()
    }

    async fn open_if_empty(&self) -> Result<PgPool, DbError> {
        let mut guard = self.slot.write().await;

        // Lost the race to another first caller
        if let Some(pool) = guard.pool.as_ref() {
            return Ok(pool.clone());
        }

        tracing::info!("Creating database connection");
        let pool = self.open().await?;
        guard.generation += 1;
        guard.pool = Some(pool.clone());
        Ok(pool)
    }

    async fn reopen(&self, stale_generation: u64) -> Result<PgPool, DbError> {
        let mut guard = self.slot.write().await;

        // Another task already replaced the handle we saw fail
        if guard.generation != stale_generation {
            if let Some(pool) = guard.pool.as_ref() {
                return Ok(pool.clone());
            }
        }

        // Pool::close waits for checked-out connections; never under the lock
        if let Some(stale) = guard.pool.take() {
            tokio::spawn(async move { stale.close().await });
        }

        let pool = self.open().await?;
        guard.generation += 1;
        guard.pool = Some(pool.clone());
        tracing::info!(generation = guard.generation, "Database connection reopened");
        Ok(pool)
    }

    async fn open(&self) -> Result<PgPool, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.config.acquire_timeout)
            .connect(&self.config.database_url)
            .await?;

        if let Err(e) = ping(&pool).await {
            pool.close().await;
            return Err(e);
        }

        Ok(pool)
    }
}

/// Liveness check on one pooled connection.
async fn ping(pool: &PgPool) -> Result<(), DbError> {
    let mut conn = pool.acquire().await?;
    conn.ping().await?;
    Ok(())
}
