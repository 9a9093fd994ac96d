//! Session errors

use services_auth::AuthError;
use services_fs::FsError;
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

/// Errors surfaced by session commands
///
/// None of these end the session; the command reports and the caller
/// carries on with its context unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Fs(#[from] FsError),

    /// The acting identity may not perform this command at all
    #[error("{user} is not allowed to {action}")]
    NotPermitted { user: String, action: String },

    #[error("Authentication failure for {0}")]
    AuthenticationFailed(String),

    /// The new secret and its confirmation differ
    #[error("Passwords do not match")]
    SecretMismatch,
}
