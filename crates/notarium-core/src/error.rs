//! Error types for notarium.

use thiserror::Error;

/// Result type alias using notarium's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable failure classification surfaced to transport layers.
///
/// Every domain error maps to exactly one kind; the HTTP layer translates
/// kinds to status codes without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced entity does not exist.
    NotFound,
    /// Caller lacks the role or flag the mutation requires.
    PermissionDenied,
    /// A named domain constraint blocks the operation.
    BusinessRule,
    /// Requested transition does not apply to the entity's current state.
    InvalidState,
    /// Caller-supplied input fails structural constraints.
    Validation,
    /// Unexpected store or infrastructure failure.
    Internal,
}

/// Core error type for notarium operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Workspace not found
    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(i64),

    /// Note not found
    #[error("Note not found: {0}")]
    NoteNotFound(i64),

    /// Invitation not found
    #[error("Invitation not found: {0}")]
    InvitationNotFound(i64),

    /// Caller lacks the required role/flag for the requested mutation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A named domain constraint blocks the operation
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Requested transition does not apply to the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Caller-supplied input fails structural constraints
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// The stable kind this error maps to at the operation boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_)
            | Error::WorkspaceNotFound(_)
            | Error::NoteNotFound(_)
            | Error::InvitationNotFound(_) => ErrorKind::NotFound,
            Error::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Error::BusinessRule(_) => ErrorKind::BusinessRule,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Database(_) | Error::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("serialization: {}", e))
    }
}
