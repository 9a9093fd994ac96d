//! Filesystem errors

use fs_entry::EntryKind;
use policy::DenialReason;
use thiserror::Error;

/// Result type for gateway operations
pub type FsResult<T> = Result<T, FsError>;

/// Errors that can occur during filesystem operations
///
/// Every variant is recoverable by the calling command; none of them ends
/// the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FsError {
    /// Access-control refusal
    #[error("{path}: Permission denied ({reason})")]
    PermissionDenied { path: String, reason: DenialReason },

    #[error("{0}: No such file or directory")]
    NotFound(String),

    /// Create collision
    #[error("{0}: File exists")]
    AlreadyExists(String),

    #[error("{0}: Is a directory")]
    IsADirectory(String),

    #[error("{0}: Not a directory")]
    NotADirectory(String),

    /// An update tried to change the kind of an existing entry
    #[error("{path}: cannot replace {existing} with {requested}")]
    TypeMismatch {
        path: String,
        existing: EntryKind,
        requested: EntryKind,
    },

    #[error("{0}: Directory not empty")]
    NotEmpty(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A directory cannot be moved beneath itself
    #[error("cannot move '{from}' to a subdirectory of itself, '{to}'")]
    InvalidMove { from: String, to: String },
}

impl FsError {
    /// The access-control reason, for permission denials
    pub fn reason(&self) -> Option<&DenialReason> {
        match self {
            FsError::PermissionDenied { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FsError::PermissionDenied { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}
