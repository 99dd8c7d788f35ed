//! Core data models for notarium.
//!
//! These types are shared across all notarium crates and represent the
//! core domain entities. Entity cross-references are plain id fields; the
//! store layer performs explicit joins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults;

// =============================================================================
// USERS
// =============================================================================

/// A registered user account.
///
/// The password credential is opaque to this core; hashing and verification
/// belong to the external identity collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// WORKSPACES
// =============================================================================

/// Workspace kind. A user's `Personal` workspace is created at registration
/// and is otherwise indistinguishable from a `Team` workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceType {
    Personal,
    Team,
}

impl std::fmt::Display for WorkspaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Personal => write!(f, "personal"),
            Self::Team => write!(f, "team"),
        }
    }
}

impl std::str::FromStr for WorkspaceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "personal" => Ok(Self::Personal),
            "team" => Ok(Self::Team),
            _ => Err(format!("Invalid workspace type: {}", s)),
        }
    }
}

/// A named container of notes with an owner and a bounded member set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: i64,
    pub name: String,
    pub workspace_type: WorkspaceType,
    pub owner_user_id: i64,
    pub created_at_utc: DateTime<Utc>,
}

/// Workspace annotated with live member/active-note counts.
///
/// Counts are computed at query time, never denormalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceView {
    pub id: i64,
    pub name: String,
    pub workspace_type: WorkspaceType,
    pub owner_user_id: i64,
    pub created_at_utc: DateTime<Utc>,
    pub member_count: i64,
    pub note_count: i64,
}

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Role of a workspace member.
///
/// Each workspace has exactly one `Owner`, created with the workspace and
/// never independently removable. `Admin` carries share rights but is never
/// granted by this core; it can only arrive via externally seeded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Member,
}

impl std::fmt::Display for WorkspaceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::Member => write!(f, "member"),
        }
    }
}

impl std::str::FromStr for WorkspaceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            _ => Err(format!("Invalid workspace role: {}", s)),
        }
    }
}

/// The (workspace, user) relation carrying role and edit/share rights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceMember {
    pub workspace_id: i64,
    pub user_id: i64,
    pub role: WorkspaceRole,
    pub can_edit: bool,
    pub can_share: bool,
    pub joined_at_utc: DateTime<Utc>,
}

/// Member row joined with the member's username for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    pub user_id: i64,
    pub username: String,
    pub role: WorkspaceRole,
    pub can_edit: bool,
    pub can_share: bool,
    pub joined_at_utc: DateTime<Utc>,
}

// =============================================================================
// INVITATIONS
// =============================================================================

/// Invitation lifecycle status.
///
/// `Pending` is the only non-terminal state; every other status is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
    Revoked,
}

impl InvitationStatus {
    /// True iff no further transition may leave this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
            Self::Revoked => write!(f, "revoked"),
        }
    }
}

impl std::str::FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            "revoked" => Ok(Self::Revoked),
            _ => Err(format!("Invalid invitation status: {}", s)),
        }
    }
}

/// A proposed membership awaiting the invitee's decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    pub id: i64,
    pub workspace_id: i64,
    pub inviter_user_id: i64,
    pub invitee_user_id: i64,
    pub can_edit: bool,
    pub can_share: bool,
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub created_at_utc: DateTime<Utc>,
    pub responded_at_utc: Option<DateTime<Utc>>,
}

/// Invitation joined with workspace name and inviter username for the
/// invitee-facing listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationView {
    pub invitation_id: i64,
    pub workspace_id: i64,
    pub workspace_name: String,
    pub inviter_user_id: i64,
    pub inviter_username: String,
    pub can_edit: bool,
    pub can_share: bool,
    pub message: Option<String>,
    pub status: InvitationStatus,
    pub created_at_utc: DateTime<Utc>,
    pub responded_at_utc: Option<DateTime<Utc>>,
}

// =============================================================================
// NOTES
// =============================================================================

/// Editor kind of a note. Determines the default content document seeded
/// at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    Markdown,
    Canvas,
    MindMap,
    RichText,
}

impl NoteType {
    /// Default JSON content document for a freshly created note.
    pub fn default_content(&self) -> &'static str {
        match self {
            Self::Markdown => defaults::MARKDOWN_TEMPLATE,
            Self::Canvas => defaults::CANVAS_TEMPLATE,
            Self::MindMap => defaults::MINDMAP_TEMPLATE,
            Self::RichText => defaults::RICHTEXT_TEMPLATE,
        }
    }
}

impl std::fmt::Display for NoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Canvas => write!(f, "canvas"),
            Self::MindMap => write!(f, "mind_map"),
            Self::RichText => write!(f, "rich_text"),
        }
    }
}

impl std::str::FromStr for NoteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" => Ok(Self::Markdown),
            "canvas" => Ok(Self::Canvas),
            "mind_map" | "mindmap" => Ok(Self::MindMap),
            "rich_text" | "richtext" => Ok(Self::RichText),
            _ => Err(format!("Invalid note type: {}", s)),
        }
    }
}

/// A note record. The workspace id is immutable for the note's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub workspace_id: i64,
    pub title: String,
    pub note_type: NoteType,
    pub content: String,
    pub category_id: Option<i64>,
    pub is_deleted: bool,
    pub deleted_at_utc: Option<DateTime<Utc>>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Note joined with its category name/color and tag set for listings and
/// detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteView {
    pub id: i64,
    pub workspace_id: i64,
    pub title: String,
    pub note_type: NoteType,
    pub content: String,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub category_color: Option<String>,
    pub tags: Vec<Tag>,
    pub is_deleted: bool,
    pub deleted_at_utc: Option<DateTime<Utc>>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Reduced view of a soft-deleted note for the recycle-bin listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedNoteView {
    pub id: i64,
    pub workspace_id: i64,
    pub title: String,
    pub deleted_at_utc: Option<DateTime<Utc>>,
    pub updated_at_utc: DateTime<Utc>,
}

// =============================================================================
// CATEGORIES AND TAGS
// =============================================================================

/// A per-user note category. Name is unique per owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub color: Option<String>,
    pub sort_order: i32,
    pub created_at_utc: DateTime<Utc>,
}

/// A per-user tag. Name is unique per owning user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub color: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}
