//! # Authentication & Credential Store
//!
//! Accounts, groups and credentials live as line-oriented text inside three
//! ordinary files of the simulated filesystem (`/etc/passwd`, `/etc/shadow`,
//! `/etc/group` by default). This crate parses and rewrites those files and
//! keeps the time-limited elevated-privilege cache.
//!
//! ## Philosophy
//!
//! - Records are decoded once at the boundary into typed values
//!   ([`CredentialState`] instead of string prefix tests)
//! - Every mutation rewrites the whole record file, but lines it did not
//!   change (including ones it could not decode) come back byte for byte
//! - A missing record file is an expected state ("no such identity"), not a fault
//! - The store acts through the filesystem gateway as root, the way a
//!   privileged helper would
//!
//! ## Security
//!
//! Secrets are encoded with an unsalted SHA-256 digest. This is a
//! placeholder and is **not** a secure password hash.

pub mod cache;
pub mod config;
pub mod error;
pub mod records;
pub mod secret;
pub mod store;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use records::{AccountRecord, CredentialState, Record, ShadowRecord, Table};
pub use secret::encode_secret;
pub use store::CredentialStore;
