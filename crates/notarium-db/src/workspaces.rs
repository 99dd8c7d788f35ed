//! Workspace manager implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use notarium_core::{
    permissions, CreateWorkspaceRequest, Error, Result, WorkspaceRole, WorkspaceStore,
    WorkspaceView,
};

use crate::lookups::{fetch_membership, fetch_workspace};

/// PostgreSQL implementation of WorkspaceStore.
pub struct PgWorkspaceStore {
    pool: PgPool,
}

impl PgWorkspaceStore {
    /// Create a new PgWorkspaceStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_view(row: &sqlx::postgres::PgRow) -> Result<WorkspaceView> {
    Ok(WorkspaceView {
        id: row.get("id"),
        name: row.get("name"),
        workspace_type: row
            .get::<String, _>("workspace_type")
            .parse()
            .map_err(Error::Internal)?,
        owner_user_id: row.get("owner_user_id"),
        created_at_utc: row.get("created_at_utc"),
        member_count: row.get("member_count"),
        note_count: row.get("note_count"),
    })
}

/// Live member/active-note counts, computed at query time.
const VIEW_COLUMNS: &str = "w.id, w.name, w.workspace_type, w.owner_user_id, w.created_at_utc,
    (SELECT COUNT(*) FROM workspace_member m2 WHERE m2.workspace_id = w.id) AS member_count,
    (SELECT COUNT(*) FROM note n WHERE n.workspace_id = w.id AND n.is_deleted = FALSE) AS note_count";

#[async_trait]
impl WorkspaceStore for PgWorkspaceStore {
    async fn create(&self, owner_id: i64, req: CreateWorkspaceRequest) -> Result<WorkspaceView> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation(
                "workspace name must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let workspace_id: i64 = sqlx::query_scalar(
            "INSERT INTO workspace (name, workspace_type, owner_user_id, created_at_utc)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(&name)
        .bind(req.workspace_type.to_string())
        .bind(owner_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        // The creator joins as Owner in the same transaction.
        sqlx::query(
            "INSERT INTO workspace_member (workspace_id, user_id, role, can_edit, can_share, joined_at_utc)
             VALUES ($1, $2, $3, TRUE, TRUE, $4)",
        )
        .bind(workspace_id)
        .bind(owner_id)
        .bind(WorkspaceRole::Owner.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(WorkspaceView {
            id: workspace_id,
            name,
            workspace_type: req.workspace_type,
            owner_user_id: owner_id,
            created_at_utc: now,
            member_count: 1,
            note_count: 0,
        })
    }

    async fn get_user_workspaces(&self, user_id: i64) -> Result<Vec<WorkspaceView>> {
        let rows = sqlx::query(&format!(
            "SELECT {VIEW_COLUMNS}
             FROM workspace w
             WHERE w.owner_user_id = $1
                OR EXISTS (SELECT 1 FROM workspace_member m
                           WHERE m.workspace_id = w.id AND m.user_id = $1)
             ORDER BY w.created_at_utc"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(map_view).collect()
    }

    async fn get_detail(&self, workspace_id: i64, caller_id: i64) -> Result<WorkspaceView> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        let membership = fetch_membership(&self.pool, workspace_id, caller_id).await?;
        if !permissions::has_view_right(&workspace, caller_id, membership.as_ref()) {
            return Err(Error::PermissionDenied(
                "you are not a member of this workspace".to_string(),
            ));
        }

        let row = sqlx::query(&format!(
            "SELECT {VIEW_COLUMNS} FROM workspace w WHERE w.id = $1"
        ))
        .bind(workspace_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        map_view(&row)
    }

    async fn delete(&self, workspace_id: i64, caller_id: i64, force: bool) -> Result<()> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        permissions::check_delete_workspace(&workspace, caller_id)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let active_notes: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM note WHERE workspace_id = $1 AND is_deleted = FALSE)",
        )
        .bind(workspace_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if active_notes && !force {
            return Err(Error::BusinessRule(
                "workspace has active notes".to_string(),
            ));
        }

        let now = Utc::now();
        let mut swept = 0;
        if active_notes {
            // Force mode: notes land in the recycle bin before the workspace
            // row goes away.
            swept = sqlx::query(
                "UPDATE note
                 SET is_deleted = TRUE, deleted_at_utc = $1, updated_at_utc = $1
                 WHERE workspace_id = $2 AND is_deleted = FALSE",
            )
            .bind(now)
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();
        }

        // Memberships are cleared before the workspace row so no reference
        // ever dangles.
        sqlx::query("DELETE FROM workspace_member WHERE workspace_id = $1")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("DELETE FROM workspace WHERE id = $1")
            .bind(workspace_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            op = "delete_workspace",
            workspace_id,
            user_id = caller_id,
            force,
            affected = swept,
            "Deleted workspace"
        );
        Ok(())
    }
}
