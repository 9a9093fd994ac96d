//! # Access Control
//!
//! This crate decides whether an identity may perform an operation on a path.
//!
//! ## Philosophy
//!
//! - **One decision function**: every read and mutation in the system asks
//!   [`AccessPolicy::check`]; nothing re-derives permissions on its own
//! - **Decisions explain themselves**: a denial carries a [`DenialReason`]
//!   with a stable [`code`](DenialReason::code), so callers can print a
//!   precise diagnostic without guessing the cause
//! - **Fail closed**: an undecodable descriptor has already been reduced to
//!   "no bits" by the entry model, so it can only ever deny
//!
//! ## Core Concepts
//!
//! - [`Access`]: read, write, traverse, or delete-within
//! - [`Decision`]: `Allowed(Grant)` or `Denied(DenialReason)`
//! - [`EntryLookup`]: read-only view of the path → entry mapping
//! - [`PosixPolicy`]: owner/group/other triplets, ancestor traversal, sticky
//!   directories and the UID 0 override

pub mod decision;
pub mod engine;

pub use decision::{Access, Decision, DenialReason, Grant};
pub use engine::{AccessPolicy, EntryLookup, PosixPolicy};
