//! Centralized default constants for notarium.
//!
//! **This module is the single source of truth** for shared default values.
//! All crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Hard cap of members per workspace, including the owner. Enforced at
/// invite/add time.
pub const MAX_WORKSPACE_MEMBERS: i64 = 6;

// =============================================================================
// NOTE CONTENT TEMPLATES
// =============================================================================

/// Default content document for a Markdown note.
pub const MARKDOWN_TEMPLATE: &str = r#"{"md": "", "html": ""}"#;

/// Default content document for a Canvas note.
pub const CANVAS_TEMPLATE: &str = r#"{"elements": []}"#;

/// Default content document for a MindMap note.
pub const MINDMAP_TEMPLATE: &str = r#"{"nodes": [], "edges": []}"#;

/// Default content document for a RichText note.
pub const RICHTEXT_TEMPLATE: &str = r#"{"content": ""}"#;

// =============================================================================
// REGISTRATION
// =============================================================================

/// Display-name suffix of the personal workspace created at registration.
pub const PERSONAL_WORKSPACE_SUFFIX: &str = "'s personal space";

/// Name of the personal workspace seeded for a new user.
pub fn personal_workspace_name(username: &str) -> String {
    format!("{}{}", username, PERSONAL_WORKSPACE_SUFFIX)
}
