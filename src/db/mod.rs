//! Optional PostgreSQL backend for delivery records, device tokens and
//! notification facts.

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

pub type DbPool = PgPool;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database pool error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Opens the pool and applies `./migrations`
///
/// Returns `None` when no database is configured, in which case the caller
/// falls back to the in-memory stores.
pub async fn connect(config: Option<&DatabaseConfig>) -> Result<Option<DbPool>, DbError> {
    let Some(config) = config else {
        log::warn!("DATABASE_URL not set, delivery records are kept in memory only");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // delivery timestamps are compared across instances
                sqlx::query("SET timezone = 'UTC'").execute(conn).await?;
                Ok(())
            })
        })
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    log::info!(
        "Delivery store ready on PostgreSQL ({}..{} connections)",
        config.min_connections,
        config.max_connections
    );

    Ok(Some(pool))
}

pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
