//! Authentication errors

use services_fs::FsError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}: no such user")]
    IdentityNotFound(String),

    #[error("{0}: no such group")]
    GroupNotFound(String),

    #[error("Authentication failure for {0}")]
    AuthenticationFailed(String),

    #[error("{0}: already exists")]
    AlreadyExists(String),

    /// Names must be lowercase ASCII letters, digits, `_` or `-`, not starting with a digit or `-`
    #[error("{0}: invalid name")]
    InvalidName(String),

    /// Every id above the regular range start is taken
    #[error("no free {0} left")]
    IdsExhausted(&'static str),

    #[error("Invalid auth configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Fs(#[from] FsError),
}
