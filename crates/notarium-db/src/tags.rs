//! Tag store and note↔tag binder implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use notarium_core::{
    permissions, CreateTagRequest, Error, Result, Tag, TagStore, UpdateTagRequest,
};

use crate::lookups::{fetch_membership, fetch_note, fetch_workspace};

/// PostgreSQL implementation of TagStore.
pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    /// Create a new PgTagStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn name_exists(&self, user_id: i64, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM tag
             WHERE user_id = $1 AND name = $2 AND ($3::BIGINT IS NULL OR id <> $3))",
        )
        .bind(user_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }
}

fn map_tag(row: &sqlx::postgres::PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        color: row.get("color"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn list(&self, user_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, color, created_at_utc
             FROM tag WHERE user_id = $1
             ORDER BY name",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_tag).collect())
    }

    async fn create(&self, user_id: i64, req: CreateTagRequest) -> Result<i64> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("tag name must not be empty".to_string()));
        }
        if self.name_exists(user_id, &name, None).await? {
            return Err(Error::BusinessRule(format!(
                "a tag named '{}' already exists",
                name
            )));
        }

        sqlx::query_scalar(
            "INSERT INTO tag (user_id, name, color, created_at_utc)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(user_id)
        .bind(&name)
        .bind(&req.color)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn update(&self, user_id: i64, tag_id: i64, req: UpdateTagRequest) -> Result<()> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("tag name must not be empty".to_string()));
        }
        if self.name_exists(user_id, &name, Some(tag_id)).await? {
            return Err(Error::BusinessRule(format!(
                "a tag named '{}' already exists",
                name
            )));
        }

        let affected = sqlx::query(
            "UPDATE tag SET name = $1, color = $2 WHERE id = $3 AND user_id = $4",
        )
        .bind(&name)
        .bind(&req.color)
        .bind(tag_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!("tag {}", tag_id)));
        }
        Ok(())
    }

    async fn delete(&self, user_id: i64, tag_id: i64) -> Result<()> {
        let owned: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tag WHERE id = $1 AND user_id = $2)")
                .bind(tag_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        if !owned {
            return Err(Error::NotFound(format!("tag {}", tag_id)));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Associations go first; junction rows never outlive the tag.
        sqlx::query("DELETE FROM note_tag WHERE tag_id = $1")
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn note_tags(&self, note_id: i64, user_id: i64) -> Result<Vec<Tag>> {
        let note = fetch_note(&self.pool, note_id).await?;
        let workspace = fetch_workspace(&self.pool, note.workspace_id).await?;
        let membership = fetch_membership(&self.pool, note.workspace_id, user_id).await?;
        if !permissions::has_view_right(&workspace, user_id, membership.as_ref()) {
            return Err(Error::PermissionDenied(
                "you may not view this note's tags".to_string(),
            ));
        }

        let rows = sqlx::query(
            "SELECT t.id, t.user_id, t.name, t.color, t.created_at_utc
             FROM note_tag nt
             JOIN tag t ON t.id = nt.tag_id
             WHERE nt.note_id = $1
             ORDER BY t.name",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(map_tag).collect())
    }

    async fn set_note_tags(&self, note_id: i64, user_id: i64, tag_ids: &[i64]) -> Result<()> {
        let note = fetch_note(&self.pool, note_id).await?;
        let workspace = fetch_workspace(&self.pool, note.workspace_id).await?;
        let membership = fetch_membership(&self.pool, note.workspace_id, user_id).await?;
        if !permissions::has_edit_right(&workspace, user_id, membership.as_ref()) {
            return Err(Error::PermissionDenied(
                "you may not change this note's tags".to_string(),
            ));
        }

        // Foreign tag ids are dropped, not rejected; the surviving set is
        // distinct by construction.
        let owned: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM tag WHERE user_id = $1 AND id = ANY($2)")
                .bind(user_id)
                .bind(tag_ids)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Replace wholesale rather than diffing.
        sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for tag_id in &owned {
            sqlx::query("INSERT INTO note_tag (note_id, tag_id) VALUES ($1, $2)")
                .bind(note_id)
                .bind(*tag_id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            op = "set_note_tags",
            note_id,
            user_id,
            affected = owned.len() as u64,
            "Replaced note tag set"
        );
        Ok(())
    }
}
