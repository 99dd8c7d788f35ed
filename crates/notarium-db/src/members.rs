//! Membership registry implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use notarium_core::{
    defaults, permissions, Error, MemberView, MembershipRegistry, Result, WorkspaceRole,
};

use crate::lookups::{fetch_membership, fetch_workspace};

/// PostgreSQL implementation of MembershipRegistry.
pub struct PgMembershipRegistry {
    pool: PgPool,
}

impl PgMembershipRegistry {
    /// Create a new PgMembershipRegistry with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRegistry for PgMembershipRegistry {
    async fn is_member(&self, workspace_id: i64, user_id: i64) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM workspace_member
             WHERE workspace_id = $1 AND user_id = $2)",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn is_owner(&self, workspace_id: i64, user_id: i64) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM workspace
             WHERE id = $1 AND owner_user_id = $2)",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn has_edit_right(&self, workspace_id: i64, user_id: i64) -> Result<bool> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        let membership = fetch_membership(&self.pool, workspace_id, user_id).await?;
        Ok(permissions::has_edit_right(
            &workspace,
            user_id,
            membership.as_ref(),
        ))
    }

    async fn has_share_right(&self, workspace_id: i64, user_id: i64) -> Result<bool> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        let membership = fetch_membership(&self.pool, workspace_id, user_id).await?;
        Ok(permissions::has_share_right(
            &workspace,
            user_id,
            membership.as_ref(),
        ))
    }

    async fn list_members(&self, workspace_id: i64, caller_id: i64) -> Result<Vec<MemberView>> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        let membership = fetch_membership(&self.pool, workspace_id, caller_id).await?;
        if !permissions::has_view_right(&workspace, caller_id, membership.as_ref()) {
            return Err(Error::PermissionDenied(
                "only members may list the member roster".to_string(),
            ));
        }

        let rows = sqlx::query(
            "SELECT m.user_id, u.username, m.role, m.can_edit, m.can_share, m.joined_at_utc
             FROM workspace_member m
             JOIN app_user u ON u.id = m.user_id
             WHERE m.workspace_id = $1
             ORDER BY m.joined_at_utc",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                Ok(MemberView {
                    user_id: row.get("user_id"),
                    username: row.get("username"),
                    role: row
                        .get::<String, _>("role")
                        .parse::<WorkspaceRole>()
                        .map_err(Error::Internal)?,
                    can_edit: row.get("can_edit"),
                    can_share: row.get("can_share"),
                    joined_at_utc: row.get("joined_at_utc"),
                })
            })
            .collect()
    }

    async fn member_count(&self, workspace_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM workspace_member WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn add_member(
        &self,
        workspace_id: i64,
        user_id: i64,
        role: WorkspaceRole,
        can_edit: bool,
        can_share: bool,
    ) -> Result<()> {
        fetch_workspace(&self.pool, workspace_id).await?;

        if self.is_member(workspace_id, user_id).await? {
            return Err(Error::BusinessRule(
                "user is already a workspace member".to_string(),
            ));
        }

        let count = self.member_count(workspace_id).await?;
        if count >= defaults::MAX_WORKSPACE_MEMBERS {
            return Err(Error::BusinessRule(format!(
                "workspace member capacity exceeded (max {})",
                defaults::MAX_WORKSPACE_MEMBERS
            )));
        }

        sqlx::query(
            "INSERT INTO workspace_member (workspace_id, user_id, role, can_edit, can_share, joined_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(role.to_string())
        .bind(can_edit)
        .bind(can_share)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn remove_member(
        &self,
        workspace_id: i64,
        caller_id: i64,
        target_user_id: i64,
    ) -> Result<()> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        permissions::check_remove_member(&workspace, caller_id, target_user_id)?;

        let affected = sqlx::query(
            "DELETE FROM workspace_member WHERE workspace_id = $1 AND user_id = $2",
        )
        .bind(workspace_id)
        .bind(target_user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!(
                "user {} is not a member of workspace {}",
                target_user_id, workspace_id
            )));
        }

        info!(
            subsystem = "db",
            op = "remove_member",
            workspace_id,
            user_id = target_user_id,
            "Removed workspace member"
        );
        Ok(())
    }

    async fn update_permissions(
        &self,
        workspace_id: i64,
        caller_id: i64,
        target_user_id: i64,
        can_edit: bool,
        can_share: bool,
    ) -> Result<()> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        permissions::check_update_permissions(&workspace, caller_id, target_user_id)?;

        let affected = sqlx::query(
            "UPDATE workspace_member SET can_edit = $1, can_share = $2
             WHERE workspace_id = $3 AND user_id = $4",
        )
        .bind(can_edit)
        .bind(can_share)
        .bind(workspace_id)
        .bind(target_user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!(
                "user {} is not a member of workspace {}",
                target_user_id, workspace_id
            )));
        }
        Ok(())
    }

    async fn leave_workspace(&self, workspace_id: i64, user_id: i64) -> Result<()> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        permissions::check_leave(&workspace, user_id)?;

        let affected = sqlx::query(
            "DELETE FROM workspace_member WHERE workspace_id = $1 AND user_id = $2",
        )
        .bind(workspace_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        if affected == 0 {
            return Err(Error::NotFound(format!(
                "user {} is not a member of workspace {}",
                user_id, workspace_id
            )));
        }

        info!(
            subsystem = "db",
            op = "leave_workspace",
            workspace_id,
            user_id,
            "Member left workspace"
        );
        Ok(())
    }
}
