//! Database module for SQLite persistence.
//!
//! Backs the relational release store: one table of release-note snapshots,
//! exactly one of which is active.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS release_notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            release_note TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 0,
            created_on TEXT NOT NULL,
            updated_on TEXT
        );
        "#,
    )
    .execute(pool)
    .await?;

    // At most one active snapshot
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_release_notes_single_active
            ON release_notes(is_active) WHERE is_active = 1;
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
