//! Schema initialization for the expenses table

use sqlx::PgPool;

use super::repos::DbError;

/// Create the `expenses` table if it does not exist yet.
///
/// Safe to run on every startup. Callers should treat failure as fatal:
/// the service cannot serve requests without the table.
pub async fn ensure_table(pool: &PgPool) -> Result<(), DbError> {
    tracing::info!("Ensuring expenses table exists");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS expenses (
            id SERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            amount DOUBLE PRECISION NOT NULL,
            note TEXT NOT NULL,
            tags TEXT[] NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
