//! Shared row lookups and mapping helpers.
//!
//! Entity cross-references are plain id columns; these helpers perform the
//! explicit fetches the store modules build their authorization checks on.

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use notarium_core::{
    Error, Note, NoteType, Result, Workspace, WorkspaceMember, WorkspaceRole, WorkspaceType,
};

pub(crate) fn map_workspace_row(row: &PgRow) -> Result<Workspace> {
    Ok(Workspace {
        id: row.get("id"),
        name: row.get("name"),
        workspace_type: row
            .get::<String, _>("workspace_type")
            .parse::<WorkspaceType>()
            .map_err(Error::Internal)?,
        owner_user_id: row.get("owner_user_id"),
        created_at_utc: row.get("created_at_utc"),
    })
}

pub(crate) fn map_member_row(row: &PgRow) -> Result<WorkspaceMember> {
    Ok(WorkspaceMember {
        workspace_id: row.get("workspace_id"),
        user_id: row.get("user_id"),
        role: row
            .get::<String, _>("role")
            .parse::<WorkspaceRole>()
            .map_err(Error::Internal)?,
        can_edit: row.get("can_edit"),
        can_share: row.get("can_share"),
        joined_at_utc: row.get("joined_at_utc"),
    })
}

pub(crate) fn map_note_row(row: &PgRow) -> Result<Note> {
    Ok(Note {
        id: row.get("id"),
        workspace_id: row.get("workspace_id"),
        title: row.get("title"),
        note_type: row
            .get::<String, _>("note_type")
            .parse::<NoteType>()
            .map_err(Error::Internal)?,
        content: row.get("content"),
        category_id: row.get("category_id"),
        is_deleted: row.get("is_deleted"),
        deleted_at_utc: row.get("deleted_at_utc"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
    })
}

/// Fetch a workspace or fail with `WorkspaceNotFound`.
pub(crate) async fn fetch_workspace(pool: &PgPool, workspace_id: i64) -> Result<Workspace> {
    let row = sqlx::query(
        "SELECT id, name, workspace_type, owner_user_id, created_at_utc
         FROM workspace WHERE id = $1",
    )
    .bind(workspace_id)
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)?;

    match row {
        Some(row) => map_workspace_row(&row),
        None => Err(Error::WorkspaceNotFound(workspace_id)),
    }
}

/// Fetch the membership row for (workspace, user), if any.
pub(crate) async fn fetch_membership(
    pool: &PgPool,
    workspace_id: i64,
    user_id: i64,
) -> Result<Option<WorkspaceMember>> {
    let row = sqlx::query(
        "SELECT workspace_id, user_id, role, can_edit, can_share, joined_at_utc
         FROM workspace_member WHERE workspace_id = $1 AND user_id = $2",
    )
    .bind(workspace_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)?;

    row.as_ref().map(map_member_row).transpose()
}

/// Fetch a note (deleted or not) or fail with `NoteNotFound`.
pub(crate) async fn fetch_note(pool: &PgPool, note_id: i64) -> Result<Note> {
    let row = sqlx::query(
        "SELECT id, workspace_id, title, note_type, content, category_id,
                is_deleted, deleted_at_utc, created_at_utc, updated_at_utc
         FROM note WHERE id = $1",
    )
    .bind(note_id)
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)?;

    match row {
        Some(row) => map_note_row(&row),
        None => Err(Error::NoteNotFound(note_id)),
    }
}
