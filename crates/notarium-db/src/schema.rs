//! Schema bootstrap.
//!
//! Applies the table set in dependency order so a fresh database is usable
//! without external migration tooling. Statements are idempotent; re-running
//! against an up-to-date database is a no-op.
//!
//! Cross-entity references are plain id columns. The workspace cascade
//! (force-delete) intentionally leaves soft-deleted notes behind, so notes
//! carry no enforced foreign key to their workspace.

use sqlx::PgPool;

use notarium_core::{Error, Result};

/// Ordered DDL statements for the notarium schema.
pub const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS app_user (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at_utc TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS workspace (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        workspace_type TEXT NOT NULL,
        owner_user_id BIGINT NOT NULL,
        created_at_utc TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS workspace_member (
        workspace_id BIGINT NOT NULL,
        user_id BIGINT NOT NULL,
        role TEXT NOT NULL DEFAULT 'member',
        can_edit BOOLEAN NOT NULL DEFAULT FALSE,
        can_share BOOLEAN NOT NULL DEFAULT FALSE,
        joined_at_utc TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (workspace_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS workspace_invitation (
        id BIGSERIAL PRIMARY KEY,
        workspace_id BIGINT NOT NULL,
        inviter_user_id BIGINT NOT NULL,
        invitee_user_id BIGINT NOT NULL,
        can_edit BOOLEAN NOT NULL DEFAULT FALSE,
        can_share BOOLEAN NOT NULL DEFAULT FALSE,
        message TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at_utc TIMESTAMPTZ NOT NULL,
        responded_at_utc TIMESTAMPTZ
    )",
    // Closes the concurrent-send race: at most one pending invitation per
    // (workspace, invitee).
    "CREATE UNIQUE INDEX IF NOT EXISTS workspace_invitation_pending_uniq
        ON workspace_invitation (workspace_id, invitee_user_id)
        WHERE status = 'pending'",
    "CREATE TABLE IF NOT EXISTS category (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        name TEXT NOT NULL,
        color TEXT,
        sort_order INTEGER NOT NULL DEFAULT 0,
        created_at_utc TIMESTAMPTZ NOT NULL,
        UNIQUE (user_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS tag (
        id BIGSERIAL PRIMARY KEY,
        user_id BIGINT NOT NULL,
        name TEXT NOT NULL,
        color TEXT,
        created_at_utc TIMESTAMPTZ NOT NULL,
        UNIQUE (user_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS note (
        id BIGSERIAL PRIMARY KEY,
        workspace_id BIGINT NOT NULL,
        title TEXT NOT NULL,
        note_type TEXT NOT NULL,
        content TEXT NOT NULL,
        category_id BIGINT,
        is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
        deleted_at_utc TIMESTAMPTZ,
        created_at_utc TIMESTAMPTZ NOT NULL,
        updated_at_utc TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS note_workspace_idx
        ON note (workspace_id, is_deleted)",
    "CREATE INDEX IF NOT EXISTS note_updated_idx
        ON note (updated_at_utc DESC)",
    "CREATE TABLE IF NOT EXISTS note_tag (
        note_id BIGINT NOT NULL,
        tag_id BIGINT NOT NULL,
        PRIMARY KEY (note_id, tag_id)
    )",
];

/// Apply the schema to the given pool.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }
    Ok(())
}
