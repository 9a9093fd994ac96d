//! # Filesystem Entries
//!
//! This crate defines the node model of the simulated filesystem.
//!
//! ## Design
//!
//! - There are exactly two kinds of node: [`EntryKind::File`] and
//!   [`EntryKind::Directory`]
//! - Entries do not point at each other; the filesystem is a flat mapping
//!   from absolute path to [`Entry`]
//! - Permissions are a [`Mode`]: nine rwx bits plus a sticky flag, with an
//!   exact round trip to the classic 10-character descriptor (`drwxrwxrwt`)

pub mod entry;
pub mod mode;

pub use entry::{Entry, EntryKind, DIRECTORY_SIZE};
pub use mode::{Class, Mode, ModeError, Perm};
