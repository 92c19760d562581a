//! Database repository for release-note snapshots.
//!
//! Snapshots are superseded, never deleted: every write marks the active row
//! inactive and inserts a new active row inside one transaction.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{Release, ReleaseNoteRecord};

const SELECT_ACTIVE: &str = "SELECT id, release_note, is_active, created_on, updated_on FROM release_notes WHERE is_active = 1";

/// Database repository for the `release_notes` table.
#[derive(Clone)]
pub struct ReleaseNoteRepository {
    pool: SqlitePool,
}

impl ReleaseNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the active snapshot, if any.
    pub async fn find_active(&self) -> Result<Option<ReleaseNoteRecord>, AppError> {
        let row = sqlx::query(SELECT_ACTIVE)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(record_from_row).transpose()
    }

    /// Count active snapshots. Anything but 0 or 1 is a broken invariant.
    #[cfg(test)]
    pub async fn count_active(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM release_notes WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Count all snapshots, active and superseded.
    #[cfg(test)]
    pub async fn count_all(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM release_notes")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Replace the active snapshot with `apply(current releases)`.
    ///
    /// Runs in a single transaction; any failure rolls back and leaves the
    /// previous active snapshot untouched.
    pub async fn update_active<F>(&self, apply: F) -> Result<ReleaseNoteRecord, AppError>
    where
        F: FnOnce(Vec<Release>) -> Vec<Release>,
    {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(SELECT_ACTIVE)
            .fetch_optional(&mut *tx)
            .await?;
        let (active_id, current) = match row.as_ref().map(record_from_row).transpose()? {
            Some(record) => (Some(record.id), record.release_note),
            None => (None, Vec::new()),
        };

        let releases = apply(current);
        let now = Utc::now().to_rfc3339();

        // STEP 1: retire the current snapshot
        if let Some(id) = active_id {
            sqlx::query("UPDATE release_notes SET is_active = 0, updated_on = ? WHERE id = ?")
                .bind(&now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        // STEP 2: insert the new active snapshot
        let json = serde_json::to_string(&releases)
            .map_err(|e| AppError::Internal(format!("Failed to serialize releases: {}", e)))?;
        let result = sqlx::query(
            "INSERT INTO release_notes (release_note, is_active, created_on) VALUES (?, 1, ?)",
        )
        .bind(&json)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ReleaseNoteRecord {
            id: result.last_insert_rowid(),
            release_note: releases,
            is_active: true,
            created_on: now,
            updated_on: None,
        })
    }
}

fn record_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ReleaseNoteRecord, AppError> {
    let is_active: i32 = row.get("is_active");
    let release_note: String = row.get("release_note");
    let releases = serde_json::from_str(&release_note)
        .map_err(|e| AppError::Database(format!("Corrupt release note snapshot: {}", e)))?;

    Ok(ReleaseNoteRecord {
        id: row.get("id"),
        release_note: releases,
        is_active: is_active != 0,
        created_on: row.get("created_on"),
        updated_on: row.get("updated_on"),
    })
}
