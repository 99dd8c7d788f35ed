//! User store implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::info;

use notarium_core::{
    defaults, Error, RegisterRequest, Result, User, UserStore, WorkspaceRole, WorkspaceType,
};

/// PostgreSQL implementation of UserStore.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new PgUserStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn register(&self, req: RegisterRequest) -> Result<User> {
        let username = req.username.trim().to_string();
        if username.is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM app_user WHERE username = $1)")
                .bind(&username)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
        if taken {
            return Err(Error::BusinessRule(format!(
                "username '{}' is already taken",
                username
            )));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // User, personal workspace, and owner membership commit together;
        // a created user with no workspace is a correctness bug.
        let user_id: i64 = sqlx::query_scalar(
            "INSERT INTO app_user (username, password_hash, created_at_utc)
             VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(&username)
        .bind(&req.password_hash)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let workspace_id: i64 = sqlx::query_scalar(
            "INSERT INTO workspace (name, workspace_type, owner_user_id, created_at_utc)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(defaults::personal_workspace_name(&username))
        .bind(WorkspaceType::Personal.to_string())
        .bind(user_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO workspace_member (workspace_id, user_id, role, can_edit, can_share, joined_at_utc)
             VALUES ($1, $2, $3, TRUE, TRUE, $4)",
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(WorkspaceRole::Owner.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "db",
            op = "register",
            user_id,
            workspace_id,
            "Registered user with personal workspace"
        );

        Ok(User {
            id: user_id,
            username,
            password_hash: req.password_hash,
            created_at_utc: now,
        })
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at_utc
             FROM app_user WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_user))
    }

    async fn get(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at_utc
             FROM app_user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(map_user))
    }
}
