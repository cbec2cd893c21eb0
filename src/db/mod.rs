use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use tracing::info;

pub mod entity;

const LOG_TARGET: &str = "db";
const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

pub async fn connect_to_postgres_db(database_url: &str) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url.to_owned());
    opts.max_connections(5)
        .min_connections(1)
        .sqlx_logging(false);
    Database::connect(opts)
        .await
        .with_context(|| format!("failed to connect to database at {database_url}"))
}

/// Creates any missing registry tables. Safe to run on every boot.
pub async fn ensure_schema(conn: &DatabaseConnection) -> Result<()> {
    conn.execute_unprepared(SCHEMA)
        .await
        .context("failed to apply registry schema")?;
    info!(target: LOG_TARGET, "registry schema ready");
    Ok(())
}
