//! Database pool initialization and embedded migration runner. The SQLite
//! path comes from `Config::database_url`.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    tracing::info!(url = %database_url, "connecting to database");

    let pool = SqlitePool::connect(database_url)
        .await
        .with_context(|| format!("failed to connect to database at {database_url}"))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    tracing::info!("database initialized");
    Ok(pool)
}
