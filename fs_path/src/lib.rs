//! # Path Resolution
//!
//! Pure string algebra over absolute paths.
//!
//! ## Philosophy
//!
//! - **Resolution is not access**: nothing here looks at the filesystem, so
//!   resolving a path never reveals whether it exists or who may read it
//! - **Always canonical**: every resolved path is absolute, has no `.` or
//!   `..` segments, no doubled slashes and no trailing slash (except `/`)
//! - **Never fails**: popping past the root is a no-op, not an error

pub mod path;

pub use path::{PathContext, PathResolver, ROOT};
