//! Note store implementation.
//!
//! All listing/reading goes through the accessible-workspace set; per-note
//! mutations re-check edit rights against the membership registry rows.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;

use notarium_core::{
    permissions, CreateNoteRequest, Error, NoteFilter, NoteStore, NoteView, Result, Tag,
    UpdateNoteRequest,
};

use crate::lookups::{fetch_membership, fetch_note, fetch_workspace};

/// PostgreSQL implementation of NoteStore.
pub struct PgNoteStore {
    pool: PgPool,
}

const NOTE_VIEW_COLUMNS: &str = "n.id, n.workspace_id, n.title, n.note_type, n.content,
    n.category_id, c.name AS category_name, c.color AS category_color,
    n.is_deleted, n.deleted_at_utc, n.created_at_utc, n.updated_at_utc";

impl PgNoteStore {
    /// Create a new PgNoteStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_view_row(row: &PgRow) -> Result<NoteView> {
        Ok(NoteView {
            id: row.get("id"),
            workspace_id: row.get("workspace_id"),
            title: row.get("title"),
            note_type: row
                .get::<String, _>("note_type")
                .parse()
                .map_err(Error::Internal)?,
            content: row.get("content"),
            category_id: row.get("category_id"),
            category_name: row.get("category_name"),
            category_color: row.get("category_color"),
            tags: Vec::new(),
            is_deleted: row.get("is_deleted"),
            deleted_at_utc: row.get("deleted_at_utc"),
            created_at_utc: row.get("created_at_utc"),
            updated_at_utc: row.get("updated_at_utc"),
        })
    }

    /// Attach tag sets to mapped views with one batched query.
    async fn attach_tags(&self, views: &mut [NoteView]) -> Result<()> {
        if views.is_empty() {
            return Ok(());
        }
        let note_ids: Vec<i64> = views.iter().map(|v| v.id).collect();

        let rows = sqlx::query(
            "SELECT nt.note_id, t.id, t.user_id, t.name, t.color, t.created_at_utc
             FROM note_tag nt
             JOIN tag t ON t.id = nt.tag_id
             WHERE nt.note_id = ANY($1)
             ORDER BY t.name",
        )
        .bind(&note_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_note: HashMap<i64, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_note.entry(row.get("note_id")).or_default().push(Tag {
                id: row.get("id"),
                user_id: row.get("user_id"),
                name: row.get("name"),
                color: row.get("color"),
                created_at_utc: row.get("created_at_utc"),
            });
        }
        for view in views.iter_mut() {
            if let Some(tags) = by_note.remove(&view.id) {
                view.tags = tags;
            }
        }
        Ok(())
    }

    /// True iff the user may edit notes in the given workspace.
    async fn workspace_edit_right(&self, workspace_id: i64, user_id: i64) -> Result<bool> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        let membership = fetch_membership(&self.pool, workspace_id, user_id).await?;
        Ok(permissions::has_edit_right(
            &workspace,
            user_id,
            membership.as_ref(),
        ))
    }

    /// Of the given workspace ids, those where the user holds edit rights.
    async fn editable_workspace_ids(
        &self,
        workspace_ids: &[i64],
        user_id: i64,
    ) -> Result<Vec<i64>> {
        let rows = sqlx::query_scalar(
            "SELECT w.id FROM workspace w
             WHERE w.id = ANY($1)
               AND (w.owner_user_id = $2
                    OR EXISTS (SELECT 1 FROM workspace_member m
                               WHERE m.workspace_id = w.id
                                 AND m.user_id = $2
                                 AND m.can_edit))",
        )
        .bind(workspace_ids)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(rows)
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn accessible_workspace_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        sqlx::query_scalar(
            "SELECT id FROM workspace WHERE owner_user_id = $1
             UNION
             SELECT workspace_id FROM workspace_member WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<NoteView>> {
        self.filter(user_id, NoteFilter::default()).await
    }

    async fn get(&self, note_id: i64, user_id: i64) -> Result<NoteView> {
        let note = fetch_note(&self.pool, note_id).await?;
        if note.is_deleted {
            return Err(Error::NoteNotFound(note_id));
        }
        let workspace = fetch_workspace(&self.pool, note.workspace_id).await?;
        let membership = fetch_membership(&self.pool, note.workspace_id, user_id).await?;
        if !permissions::has_view_right(&workspace, user_id, membership.as_ref()) {
            // Reads outside the accessible set do not reveal existence.
            return Err(Error::NoteNotFound(note_id));
        }

        let row = sqlx::query(&format!(
            "SELECT {NOTE_VIEW_COLUMNS}
             FROM note n
             LEFT JOIN category c ON c.id = n.category_id
             WHERE n.id = $1"
        ))
        .bind(note_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut view = Self::map_view_row(&row)?;
        self.attach_tags(std::slice::from_mut(&mut view)).await?;
        Ok(view)
    }

    async fn filter(&self, user_id: i64, filter: NoteFilter) -> Result<Vec<NoteView>> {
        let workspace_ids = self.accessible_workspace_ids(user_id).await?;
        if workspace_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = format!(
            "SELECT {NOTE_VIEW_COLUMNS}
             FROM note n
             LEFT JOIN category c ON c.id = n.category_id
             WHERE n.is_deleted = FALSE AND n.workspace_id = ANY($1) "
        );
        let mut param_idx = 2;

        // Category narrows only when positive.
        let category_id = filter.category_id.filter(|id| *id > 0);
        if category_id.is_some() {
            query.push_str(&format!("AND n.category_id = ${} ", param_idx));
            param_idx += 1;
        }

        // AND semantics: one EXISTS per requested tag.
        let tag_ids = filter.tag_ids.unwrap_or_default();
        for _ in &tag_ids {
            query.push_str(&format!(
                "AND EXISTS (SELECT 1 FROM note_tag nt
                 WHERE nt.note_id = n.id AND nt.tag_id = ${}) ",
                param_idx
            ));
            param_idx += 1;
        }

        query.push_str("ORDER BY n.updated_at_utc DESC");

        let mut q = sqlx::query(&query).bind(&workspace_ids);
        if let Some(cid) = category_id {
            q = q.bind(cid);
        }
        for tag_id in &tag_ids {
            q = q.bind(*tag_id);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(Error::Database)?;
        let mut views = rows
            .iter()
            .map(Self::map_view_row)
            .collect::<Result<Vec<_>>>()?;
        self.attach_tags(&mut views).await?;
        Ok(views)
    }

    async fn create(&self, user_id: i64, req: CreateNoteRequest) -> Result<i64> {
        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::Validation("note title must not be empty".to_string()));
        }

        if !self.workspace_edit_right(req.workspace_id, user_id).await? {
            return Err(Error::PermissionDenied(
                "you may not create notes in this workspace".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let note_id: i64 = sqlx::query_scalar(
            "INSERT INTO note
                 (workspace_id, title, note_type, content, category_id,
                  is_deleted, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6)
             RETURNING id",
        )
        .bind(req.workspace_id)
        .bind(&title)
        .bind(req.note_type.to_string())
        .bind(req.note_type.default_content())
        .bind(req.category_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // Initial tags: only the caller's own tags bind.
        if let Some(tag_ids) = &req.tag_ids {
            if !tag_ids.is_empty() {
                let owned: Vec<i64> =
                    sqlx::query_scalar("SELECT id FROM tag WHERE user_id = $1 AND id = ANY($2)")
                        .bind(user_id)
                        .bind(tag_ids)
                        .fetch_all(&mut *tx)
                        .await
                        .map_err(Error::Database)?;
                for tag_id in owned {
                    sqlx::query("INSERT INTO note_tag (note_id, tag_id) VALUES ($1, $2)")
                        .bind(note_id)
                        .bind(tag_id)
                        .execute(&mut *tx)
                        .await
                        .map_err(Error::Database)?;
                }
            }
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            op = "create_note",
            note_id,
            workspace_id = req.workspace_id,
            user_id,
            "Created note"
        );
        Ok(note_id)
    }

    async fn update(&self, note_id: i64, user_id: i64, req: UpdateNoteRequest) -> Result<()> {
        let note = fetch_note(&self.pool, note_id).await?;
        if !self.workspace_edit_right(note.workspace_id, user_id).await? {
            return Err(Error::PermissionDenied(
                "you may not edit this note".to_string(),
            ));
        }

        let mut updates: Vec<String> = vec!["updated_at_utc = $1".to_string()];
        // $1 = now, $2 = id, then dynamic params start at $3
        let mut param_idx = 3;

        let title = req.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
        if title.is_some() {
            updates.push(format!("title = ${}", param_idx));
            param_idx += 1;
        }
        let content = req.content.as_deref().filter(|c| !c.trim().is_empty());
        if content.is_some() {
            updates.push(format!("content = ${}", param_idx));
            param_idx += 1;
        }
        if req.category_id.is_some() {
            updates.push(format!("category_id = ${}", param_idx));
        }

        let query = format!("UPDATE note SET {} WHERE id = $2", updates.join(", "));

        let mut q = sqlx::query(&query).bind(Utc::now()).bind(note_id);
        if let Some(title) = title {
            q = q.bind(title.to_string());
        }
        if let Some(content) = content {
            q = q.bind(content.to_string());
        }
        if let Some(category_id) = req.category_id {
            q = q.bind(category_id);
        }

        q.execute(&self.pool).await.map_err(Error::Database)?;
        Ok(())
    }

    async fn soft_delete(&self, note_ids: &[i64], user_id: i64) -> Result<u64> {
        if note_ids.is_empty() {
            return Ok(0);
        }

        let candidates = sqlx::query(
            "SELECT id, workspace_id, is_deleted FROM note WHERE id = ANY($1)",
        )
        .bind(note_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut workspace_ids: Vec<i64> = candidates
            .iter()
            .map(|row| row.get("workspace_id"))
            .collect();
        workspace_ids.sort_unstable();
        workspace_ids.dedup();

        let editable = self.editable_workspace_ids(&workspace_ids, user_id).await?;

        // Skipped ids (no rights, already deleted, unknown) are not errors;
        // the batch reports only what it actually transitioned.
        let eligible: Vec<i64> = candidates
            .iter()
            .filter(|row| {
                !row.get::<bool, _>("is_deleted")
                    && editable.contains(&row.get::<i64, _>("workspace_id"))
            })
            .map(|row| row.get("id"))
            .collect();
        if eligible.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let affected = sqlx::query(
            "UPDATE note SET is_deleted = TRUE, deleted_at_utc = $1, updated_at_utc = $1
             WHERE id = ANY($2) AND is_deleted = FALSE",
        )
        .bind(now)
        .bind(&eligible)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        info!(
            subsystem = "db",
            op = "soft_delete",
            user_id,
            affected,
            "Moved notes to the recycle bin"
        );
        Ok(affected)
    }
}
