//! # Filesystem Gateway Service
//!
//! The only surface through which the simulated filesystem is read or
//! mutated.
//!
//! ## Philosophy
//!
//! - Every operation asks the access-control engine first
//! - Storage is a flat, ordered `path → entry` map; subtrees are prefix scans
//! - Denials surface as typed errors carrying the engine's reason
//! - Recursive removal is scan-then-act: a single denial anywhere in the
//!   subtree leaves the whole subtree untouched
//!
//! ## Operations
//!
//! - `fetch(path, access)`: checked read of an entry
//! - `store(path, entry)`: create, or update in place under the owner-or-root rule
//! - `remove(path)`: all-or-nothing delete of an entry and its subtree
//! - Built on those: `create`, `read_content`, `write_content`, `list`,
//!   `make_dir`, `make_dirs`, `chmod`, `chown`, `rename`, `touch`, `exists`

pub mod error;
pub mod gateway;
pub mod snapshot;
pub mod store;

pub use error::{FsError, FsResult};
pub use gateway::{Gateway, StoreOutcome, WriteMode};
pub use snapshot::{FsSnapshot, SnapshotError};
pub use store::FileSystem;
