//! Core traits for notarium abstractions.
//!
//! These traits define the interfaces that concrete store implementations
//! must satisfy, enabling pluggable backends and testability. All entity
//! ids are `i64`; the identity collaborator hands the core an authenticated
//! user id and nothing else.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::*;

// =============================================================================
// IDENTITY SEAM
// =============================================================================

/// Interface to the external identity collaborator.
///
/// The transport layer resolves the authenticated caller per request; this
/// core trusts the returned id unconditionally.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> i64;
}

// =============================================================================
// USERS / REGISTRATION
// =============================================================================

/// Request for registering a new user.
///
/// `password_hash` is an opaque credential produced by the external auth
/// collaborator; this core stores it verbatim.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub password_hash: String,
}

/// User account store. Registration seeds the user's personal workspace and
/// its owner membership in the same transaction.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a new user. Fails with a business-rule error on a duplicate
    /// username.
    async fn register(&self, req: RegisterRequest) -> Result<User>;

    /// Look a user up by globally unique username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Fetch a user by id.
    async fn get(&self, id: i64) -> Result<Option<User>>;
}

// =============================================================================
// MEMBERSHIP REGISTRY
// =============================================================================

/// The set of (workspace, user) relations with role and edit/share flags.
///
/// Every other component consults this registry to answer "can user U do X
/// in workspace W?".
#[async_trait]
pub trait MembershipRegistry: Send + Sync {
    async fn is_member(&self, workspace_id: i64, user_id: i64) -> Result<bool>;

    async fn is_owner(&self, workspace_id: i64, user_id: i64) -> Result<bool>;

    /// True iff owner, or member with `can_edit`.
    async fn has_edit_right(&self, workspace_id: i64, user_id: i64) -> Result<bool>;

    /// True iff owner, or member with `can_share` or role `Admin`.
    async fn has_share_right(&self, workspace_id: i64, user_id: i64) -> Result<bool>;

    /// List members ordered by join time. Caller must be a member.
    async fn list_members(&self, workspace_id: i64, caller_id: i64) -> Result<Vec<MemberView>>;

    /// Current member count, owner included.
    async fn member_count(&self, workspace_id: i64) -> Result<i64>;

    /// Insert a membership row, enforcing the per-workspace member cap.
    async fn add_member(
        &self,
        workspace_id: i64,
        user_id: i64,
        role: WorkspaceRole,
        can_edit: bool,
        can_share: bool,
    ) -> Result<()>;

    /// Remove a member. Owner-only; the owner's own entry is never removable.
    async fn remove_member(
        &self,
        workspace_id: i64,
        caller_id: i64,
        target_user_id: i64,
    ) -> Result<()>;

    /// Change a member's edit/share flags. Owner-only, never on the owner.
    async fn update_permissions(
        &self,
        workspace_id: i64,
        caller_id: i64,
        target_user_id: i64,
        can_edit: bool,
        can_share: bool,
    ) -> Result<()>;

    /// Self-removal for any non-owner member.
    async fn leave_workspace(&self, workspace_id: i64, user_id: i64) -> Result<()>;
}

// =============================================================================
// INVITATION WORKFLOW
// =============================================================================

/// Request for sending a workspace invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendInvitationRequest {
    pub invitee_username: String,
    pub can_edit: bool,
    pub can_share: bool,
    pub message: Option<String>,
}

/// The pending → accepted/rejected/revoked protocol producing membership
/// registry entries.
#[async_trait]
pub trait InvitationWorkflow: Send + Sync {
    /// All invitations addressed to a user, newest first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<InvitationView>>;

    /// Send an invitation. Returns the new invitation id.
    async fn send(
        &self,
        workspace_id: i64,
        inviter_id: i64,
        req: SendInvitationRequest,
    ) -> Result<i64>;

    /// Accept a pending invitation, creating or updating the membership
    /// seeded with the invitation's flags.
    async fn accept(&self, invitation_id: i64, caller_id: i64) -> Result<()>;

    /// Reject a pending invitation. No registry mutation.
    async fn reject(&self, invitation_id: i64, caller_id: i64) -> Result<()>;

    /// Revoke a pending invitation. Inviter or workspace owner only.
    async fn revoke(&self, invitation_id: i64, caller_id: i64) -> Result<()>;
}

// =============================================================================
// WORKSPACE MANAGER
// =============================================================================

/// Request for creating a workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub workspace_type: WorkspaceType,
}

/// Creates/destroys workspaces and orchestrates the destructive cascade.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Create a workspace and its owner membership in one atomic unit.
    async fn create(&self, owner_id: i64, req: CreateWorkspaceRequest) -> Result<WorkspaceView>;

    /// Every workspace where the user is owner or member, with live counts.
    async fn get_user_workspaces(&self, user_id: i64) -> Result<Vec<WorkspaceView>>;

    /// Single-workspace view. Members only.
    async fn get_detail(&self, workspace_id: i64, caller_id: i64) -> Result<WorkspaceView>;

    /// Delete a workspace. Owner-only. Without `force`, fails while active
    /// notes remain; with `force`, soft-deletes them first, then removes
    /// memberships, then the workspace row.
    async fn delete(&self, workspace_id: i64, caller_id: i64, force: bool) -> Result<()>;
}

// =============================================================================
// NOTES
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub workspace_id: i64,
    pub title: String,
    pub note_type: NoteType,
    pub category_id: Option<i64>,
    pub tag_ids: Option<Vec<i64>>,
}

/// Request for updating a note's title/content/category.
///
/// `title` and `content` are skipped when absent or blank. `category_id`
/// uses the outer option for "leave unchanged" and the inner for clearing.
#[derive(Debug, Clone, Default)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<Option<i64>>,
}

/// Category/tag narrowing for note listings. Tag ids combine with AND
/// semantics: a note must carry every listed tag.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub category_id: Option<i64>,
    pub tag_ids: Option<Vec<i64>>,
}

/// Note access and CRUD, authorized against the membership registry.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Workspaces owned by the user plus workspaces they are a member of.
    /// The single authorization gate for all note listing/reading.
    async fn accessible_workspace_ids(&self, user_id: i64) -> Result<Vec<i64>>;

    /// All active notes in accessible workspaces, newest update first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<NoteView>>;

    /// Fetch one active note, category and tags included.
    async fn get(&self, note_id: i64, user_id: i64) -> Result<NoteView>;

    /// Active accessible notes narrowed by category and/or tag set.
    async fn filter(&self, user_id: i64, filter: NoteFilter) -> Result<Vec<NoteView>>;

    /// Create a note with the type's default content document. Requires
    /// create rights in the target workspace.
    async fn create(&self, user_id: i64, req: CreateNoteRequest) -> Result<i64>;

    /// Update title/content/category. Requires edit rights.
    async fn update(&self, note_id: i64, user_id: i64, req: UpdateNoteRequest) -> Result<()>;

    /// Best-effort batch soft-delete; returns the number of notes actually
    /// transitioned. Ids without edit rights or already deleted are skipped.
    async fn soft_delete(&self, note_ids: &[i64], user_id: i64) -> Result<u64>;
}

// =============================================================================
// RECYCLE BIN
// =============================================================================

/// The owner-scoped recycle bin over soft-deleted notes.
#[async_trait]
pub trait RecycleBin: Send + Sync {
    /// Soft-deleted notes in workspaces the user owns, newest deletion first.
    async fn list_deleted(&self, user_id: i64) -> Result<Vec<DeletedNoteView>>;

    /// Best-effort batch restore. Owner-only; returns the restored count.
    async fn restore(&self, note_ids: &[i64], user_id: i64) -> Result<u64>;

    /// Best-effort batch purge (irreversible). Owner-only; returns the
    /// purged count.
    async fn purge(&self, note_ids: &[i64], user_id: i64) -> Result<u64>;
}

// =============================================================================
// CATEGORIES AND TAGS
// =============================================================================

/// Request for creating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub color: Option<String>,
}

/// Request for updating a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
    pub color: Option<String>,
    pub sort_order: i32,
}

/// Per-user note categories.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// The user's categories by sort order, then id.
    async fn list(&self, user_id: i64) -> Result<Vec<Category>>;

    /// Create a category; name unique per user, sort order auto-assigned.
    async fn create(&self, user_id: i64, req: CreateCategoryRequest) -> Result<i64>;

    async fn update(&self, user_id: i64, category_id: i64, req: UpdateCategoryRequest)
        -> Result<()>;

    /// Delete a category, nulling the reference on notes that used it.
    async fn delete(&self, user_id: i64, category_id: i64) -> Result<()>;
}

/// Request for creating a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

/// Request for updating a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTagRequest {
    pub name: String,
    pub color: Option<String>,
}

/// Per-user tags and the note↔tag associations.
#[async_trait]
pub trait TagStore: Send + Sync {
    /// The user's tags, by name.
    async fn list(&self, user_id: i64) -> Result<Vec<Tag>>;

    async fn create(&self, user_id: i64, req: CreateTagRequest) -> Result<i64>;

    async fn update(&self, user_id: i64, tag_id: i64, req: UpdateTagRequest) -> Result<()>;

    /// Delete a tag and all of its note associations.
    async fn delete(&self, user_id: i64, tag_id: i64) -> Result<()>;

    /// Tags attached to a note, by name. Workspace membership suffices.
    async fn note_tags(&self, note_id: i64, user_id: i64) -> Result<Vec<Tag>>;

    /// Replace a note's entire tag set. Ids of tags the user does not own
    /// are silently dropped; the remainder is de-duplicated.
    async fn set_note_tags(&self, note_id: i64, user_id: i64, tag_ids: &[i64]) -> Result<()>;
}
