//! Invitation workflow implementation.
//!
//! Status transitions are compare-and-swapped against the stored status so
//! concurrent accept/reject/revoke calls cannot double-apply effects; the
//! loser sees `InvalidState`. The double-`Pending` send race is closed by a
//! partial unique index on (workspace_id, invitee_user_id).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use notarium_core::{
    defaults, permissions, Error, Invitation, InvitationStatus, InvitationView,
    InvitationWorkflow, Result, SendInvitationRequest, WorkspaceRole,
};

use crate::lookups::{fetch_membership, fetch_workspace};

/// PostgreSQL implementation of InvitationWorkflow.
pub struct PgInvitationWorkflow {
    pool: PgPool,
}

impl PgInvitationWorkflow {
    /// Create a new PgInvitationWorkflow with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_invitation(&self, invitation_id: i64) -> Result<Invitation> {
        let row = sqlx::query(
            "SELECT id, workspace_id, inviter_user_id, invitee_user_id, can_edit, can_share,
                    message, status, created_at_utc, responded_at_utc
             FROM workspace_invitation WHERE id = $1",
        )
        .bind(invitation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let row = row.ok_or(Error::InvitationNotFound(invitation_id))?;
        Ok(Invitation {
            id: row.get("id"),
            workspace_id: row.get("workspace_id"),
            inviter_user_id: row.get("inviter_user_id"),
            invitee_user_id: row.get("invitee_user_id"),
            can_edit: row.get("can_edit"),
            can_share: row.get("can_share"),
            message: row.get("message"),
            status: row
                .get::<String, _>("status")
                .parse::<InvitationStatus>()
                .map_err(Error::Internal)?,
            created_at_utc: row.get("created_at_utc"),
            responded_at_utc: row.get("responded_at_utc"),
        })
    }

    /// Flip a pending invitation into a terminal status. Returns false if
    /// the stored status was no longer pending (a concurrent transition won).
    async fn transition<'e, E>(
        executor: E,
        invitation_id: i64,
        to: InvitationStatus,
    ) -> Result<bool>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let affected = sqlx::query(
            "UPDATE workspace_invitation SET status = $1, responded_at_utc = $2
             WHERE id = $3 AND status = $4",
        )
        .bind(to.to_string())
        .bind(Utc::now())
        .bind(invitation_id)
        .bind(InvitationStatus::Pending.to_string())
        .execute(executor)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        Ok(affected == 1)
    }
}

#[async_trait]
impl InvitationWorkflow for PgInvitationWorkflow {
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<InvitationView>> {
        let rows = sqlx::query(
            "SELECT i.id, i.workspace_id, w.name AS workspace_name,
                    i.inviter_user_id, u.username AS inviter_username,
                    i.can_edit, i.can_share, i.message, i.status,
                    i.created_at_utc, i.responded_at_utc
             FROM workspace_invitation i
             JOIN workspace w ON w.id = i.workspace_id
             JOIN app_user u ON u.id = i.inviter_user_id
             WHERE i.invitee_user_id = $1
             ORDER BY i.created_at_utc DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                Ok(InvitationView {
                    invitation_id: row.get("id"),
                    workspace_id: row.get("workspace_id"),
                    workspace_name: row.get("workspace_name"),
                    inviter_user_id: row.get("inviter_user_id"),
                    inviter_username: row.get("inviter_username"),
                    can_edit: row.get("can_edit"),
                    can_share: row.get("can_share"),
                    message: row.get("message"),
                    status: row
                        .get::<String, _>("status")
                        .parse::<InvitationStatus>()
                        .map_err(Error::Internal)?,
                    created_at_utc: row.get("created_at_utc"),
                    responded_at_utc: row.get("responded_at_utc"),
                })
            })
            .collect()
    }

    async fn send(
        &self,
        workspace_id: i64,
        inviter_id: i64,
        req: SendInvitationRequest,
    ) -> Result<i64> {
        let workspace = fetch_workspace(&self.pool, workspace_id).await?;
        let membership = fetch_membership(&self.pool, workspace_id, inviter_id).await?;
        if !permissions::has_share_right(&workspace, inviter_id, membership.as_ref()) {
            return Err(Error::PermissionDenied(
                "you may not invite members into this workspace".to_string(),
            ));
        }

        let invitee: Option<i64> = sqlx::query_scalar("SELECT id FROM app_user WHERE username = $1")
            .bind(&req.invitee_username)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        let invitee_id = invitee
            .ok_or_else(|| Error::NotFound(format!("user '{}'", req.invitee_username)))?;

        if invitee_id == inviter_id {
            return Err(Error::BusinessRule("cannot invite yourself".to_string()));
        }

        let already_member: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM workspace_member
             WHERE workspace_id = $1 AND user_id = $2)",
        )
        .bind(workspace_id)
        .bind(invitee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if already_member {
            return Err(Error::BusinessRule(
                "user is already a workspace member".to_string(),
            ));
        }

        let member_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM workspace_member WHERE workspace_id = $1")
                .bind(workspace_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        if member_count >= defaults::MAX_WORKSPACE_MEMBERS {
            return Err(Error::BusinessRule(format!(
                "workspace member capacity exceeded (max {})",
                defaults::MAX_WORKSPACE_MEMBERS
            )));
        }

        let pending_exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM workspace_invitation
             WHERE workspace_id = $1 AND invitee_user_id = $2 AND status = $3)",
        )
        .bind(workspace_id)
        .bind(invitee_id)
        .bind(InvitationStatus::Pending.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if pending_exists {
            return Err(Error::BusinessRule(
                "user already has a pending invitation for this workspace".to_string(),
            ));
        }

        let inserted = sqlx::query_scalar(
            "INSERT INTO workspace_invitation
                 (workspace_id, inviter_user_id, invitee_user_id, can_edit, can_share,
                  message, status, created_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(workspace_id)
        .bind(inviter_id)
        .bind(invitee_id)
        .bind(req.can_edit)
        .bind(req.can_share)
        .bind(&req.message)
        .bind(InvitationStatus::Pending.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        let invitation_id: i64 = match inserted {
            Ok(id) => id,
            // Concurrent sends can both pass the pending check; the partial
            // unique index picks the winner.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(Error::BusinessRule(
                    "user already has a pending invitation for this workspace".to_string(),
                ));
            }
            Err(e) => return Err(Error::Database(e)),
        };

        info!(
            subsystem = "db",
            op = "send_invitation",
            workspace_id,
            invitation_id,
            user_id = inviter_id,
            "Sent workspace invitation"
        );
        Ok(invitation_id)
    }

    async fn accept(&self, invitation_id: i64, caller_id: i64) -> Result<()> {
        let invitation = self.fetch_invitation(invitation_id).await?;
        permissions::check_respond(&invitation, caller_id)?;

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        if !Self::transition(&mut *tx, invitation_id, InvitationStatus::Accepted).await? {
            return Err(Error::InvalidState(
                "invitation has already been responded to or revoked".to_string(),
            ));
        }

        let already_member: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM workspace_member
             WHERE workspace_id = $1 AND user_id = $2)",
        )
        .bind(invitation.workspace_id)
        .bind(caller_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if already_member {
            // Race with a separate join path: the invitation's flags win.
            sqlx::query(
                "UPDATE workspace_member SET can_edit = $1, can_share = $2
                 WHERE workspace_id = $3 AND user_id = $4",
            )
            .bind(invitation.can_edit)
            .bind(invitation.can_share)
            .bind(invitation.workspace_id)
            .bind(caller_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        } else {
            let member_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM workspace_member WHERE workspace_id = $1")
                    .bind(invitation.workspace_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(Error::Database)?;
            if member_count >= defaults::MAX_WORKSPACE_MEMBERS {
                return Err(Error::BusinessRule(format!(
                    "workspace member capacity exceeded (max {})",
                    defaults::MAX_WORKSPACE_MEMBERS
                )));
            }

            sqlx::query(
                "INSERT INTO workspace_member
                     (workspace_id, user_id, role, can_edit, can_share, joined_at_utc)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(invitation.workspace_id)
            .bind(caller_id)
            .bind(WorkspaceRole::Member.to_string())
            .bind(invitation.can_edit)
            .bind(invitation.can_share)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            op = "accept_invitation",
            invitation_id,
            workspace_id = invitation.workspace_id,
            user_id = caller_id,
            "Accepted workspace invitation"
        );
        Ok(())
    }

    async fn reject(&self, invitation_id: i64, caller_id: i64) -> Result<()> {
        let invitation = self.fetch_invitation(invitation_id).await?;
        permissions::check_respond(&invitation, caller_id)?;

        if !Self::transition(&self.pool, invitation_id, InvitationStatus::Rejected).await? {
            return Err(Error::InvalidState(
                "invitation has already been responded to or revoked".to_string(),
            ));
        }
        Ok(())
    }

    async fn revoke(&self, invitation_id: i64, caller_id: i64) -> Result<()> {
        let invitation = self.fetch_invitation(invitation_id).await?;
        let workspace = fetch_workspace(&self.pool, invitation.workspace_id).await?;
        permissions::check_revoke(&invitation, workspace.owner_user_id, caller_id)?;

        if !Self::transition(&self.pool, invitation_id, InvitationStatus::Revoked).await? {
            return Err(Error::InvalidState(
                "only pending invitations can be revoked".to_string(),
            ));
        }

        info!(
            subsystem = "db",
            op = "revoke_invitation",
            invitation_id,
            workspace_id = invitation.workspace_id,
            user_id = caller_id,
            "Revoked workspace invitation"
        );
        Ok(())
    }
}
