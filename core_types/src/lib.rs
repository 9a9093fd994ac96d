//! # Core Types
//!
//! This crate defines the fundamental types shared by every layer of the
//! multi-user filesystem simulation.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: user and group ids are plain numbers, but the
//!   root identity is named, never a magic literal scattered around.
//! - **Time is injected**: nothing reads the wall clock directly; every
//!   timestamp comes from a [`Clock`] handed in by the caller.
//! - **Testability first**: [`ManualClock`] makes time-window behavior
//!   deterministic.
//!
//! ## Key Types
//!
//! - [`Uid`] / [`Gid`]: numeric user and group identifiers
//! - [`SessionId`]: unique identifier for an execution context
//! - [`Timestamp`]: milliseconds since the Unix epoch
//! - [`Clock`]: source of the current [`Timestamp`]

pub mod ids;
pub mod time;

pub use ids::{Gid, SessionId, Uid, ROOT_GID, ROOT_UID};
pub use time::{Clock, ManualClock, SystemClock, Timestamp};
