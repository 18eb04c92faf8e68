//! Error taxonomy for the entity-session core.
//!
//! Three layers, matching where a failure is allowed to travel:
//! - [`RepositoryError`]: store and cache failures, with transient
//!   (connectivity) failures distinguishable from permanent ones.
//! - [`ValidationError`]: field-level failures, local and non-fatal. They
//!   block Save only and are surfaced inline next to the field.
//! - [`SessionError`]: everything a session command can fail with. Command
//!   handlers catch these at the session boundary, log them, and convert
//!   them into user-visible notifications; they never propagate uncaught.

use thiserror::Error;
use uuid::Uuid;

/// Failures surfaced by stores and caching repositories.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("record {0} not found")]
    NotFound(Uuid),

    /// Transient backend or connectivity failure. The repository never
    /// retries internally; callers decide whether to surface or retry.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RepositoryError {
    /// Whether a retry could plausibly succeed without any other change.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Result type for store and repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Field-level validation failures. `Display` is user-facing copy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name is required")]
    NameEmpty,

    #[error("Name must be at least {0} characters")]
    NameTooShort(usize),

    #[error("Name must be at most {0} characters")]
    NameTooLong(usize),

    #[error("'{0}' is already in use")]
    DuplicateName(String),

    #[error("Description must be at most {0} characters")]
    DescriptionTooLong(usize),

    #[error("A parent must be selected")]
    ParentRequired,
}

/// Session-level failures raised by edit/list commands.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("record {0} no longer exists")]
    Missing(Uuid),

    #[error("system default records cannot be deleted")]
    SystemDefaultProtected,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
