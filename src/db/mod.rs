pub mod models;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;

const SCHEMA_VERSION: &str = "0.3.0";

pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(pool)
        .await?;

    // Client records. The CHECK constraints mirror the enum types in
    // db::models so that nothing outside the fixed vocabularies can be
    // written, regardless of which path the write took.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS clients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id TEXT NOT NULL UNIQUE,
            title TEXT,
            date_created DATETIME NOT NULL,
            date_connected DATETIME,
            date_disconnected DATETIME,
            platform TEXT NOT NULL,
            cpu TEXT NOT NULL,
            loader TEXT NOT NULL,
            protocol TEXT NOT NULL,
            method TEXT NOT NULL,
            CHECK (platform IN ('windows')),
            CHECK (cpu IN ('x86', 'x64')),
            CHECK (loader IN ('ps1')),
            CHECK (protocol IN ('ws', 'wss')),
            CHECK (method IN ('connect', 'bind'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // client_id is the lookup key for every dashboard request
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_clients_client_id
        ON clients(client_id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS console_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO console_state (key, value)
        VALUES ('schema_version', ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(SCHEMA_VERSION)
    .execute(pool)
    .await?;

    Ok(())
}
