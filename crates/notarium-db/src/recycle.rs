//! Recycle bin implementation.
//!
//! The bin is owner-scoped: soft-deleted notes are listed, restored, and
//! purged only through workspaces the caller owns. Restore is deliberately
//! more restrictive than soft-delete.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use notarium_core::{DeletedNoteView, Error, RecycleBin, Result};

/// PostgreSQL implementation of RecycleBin.
pub struct PgRecycleBin {
    pool: PgPool,
}

impl PgRecycleBin {
    /// Create a new PgRecycleBin with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Of the requested ids, the soft-deleted notes in workspaces the user
    /// owns. Everything else is silently skipped by the batch operations.
    async fn owned_deleted_ids(&self, note_ids: &[i64], user_id: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar(
            "SELECT n.id FROM note n
             JOIN workspace w ON w.id = n.workspace_id
             WHERE n.id = ANY($1) AND n.is_deleted = TRUE AND w.owner_user_id = $2",
        )
        .bind(note_ids)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }
}

#[async_trait]
impl RecycleBin for PgRecycleBin {
    async fn list_deleted(&self, user_id: i64) -> Result<Vec<DeletedNoteView>> {
        let rows = sqlx::query(
            "SELECT n.id, n.workspace_id, n.title, n.deleted_at_utc, n.updated_at_utc
             FROM note n
             JOIN workspace w ON w.id = n.workspace_id
             WHERE n.is_deleted = TRUE AND w.owner_user_id = $1
             ORDER BY COALESCE(n.deleted_at_utc, n.updated_at_utc) DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| DeletedNoteView {
                id: row.get("id"),
                workspace_id: row.get("workspace_id"),
                title: row.get("title"),
                deleted_at_utc: row.get("deleted_at_utc"),
                updated_at_utc: row.get("updated_at_utc"),
            })
            .collect())
    }

    async fn restore(&self, note_ids: &[i64], user_id: i64) -> Result<u64> {
        if note_ids.is_empty() {
            return Ok(0);
        }

        let affected = sqlx::query(
            "UPDATE note
             SET is_deleted = FALSE, deleted_at_utc = NULL, updated_at_utc = $1
             FROM workspace w
             WHERE note.id = ANY($2)
               AND note.is_deleted = TRUE
               AND note.workspace_id = w.id
               AND w.owner_user_id = $3",
        )
        .bind(Utc::now())
        .bind(note_ids)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        info!(
            subsystem = "db",
            op = "restore",
            user_id,
            affected,
            "Restored notes from the recycle bin"
        );
        Ok(affected)
    }

    async fn purge(&self, note_ids: &[i64], user_id: i64) -> Result<u64> {
        if note_ids.is_empty() {
            return Ok(0);
        }

        let eligible = self.owned_deleted_ids(note_ids, user_id).await?;
        if eligible.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Tag associations go with the note rows; no junction row may
        // outlive its note.
        sqlx::query("DELETE FROM note_tag WHERE note_id = ANY($1)")
            .bind(&eligible)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let affected = sqlx::query("DELETE FROM note WHERE id = ANY($1)")
            .bind(&eligible)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            op = "purge",
            user_id,
            affected,
            "Permanently deleted notes"
        );
        Ok(affected)
    }
}
