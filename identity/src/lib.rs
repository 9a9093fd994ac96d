//! # Identity
//!
//! This crate provides the "who is acting" primitives of the simulation.
//!
//! ## Philosophy
//!
//! - **Identity is explicit and contextual, not global**: the acting identity
//!   is a value handed to every check, never ambient state
//! - **UID 0 is the only override**: names grant nothing, the numeric id does
//! - **Elevation is a stack**: every `su` pushes what it replaced, every
//!   `exit` pops it, and nothing else touches the frames
//!
//! ## Core Concepts
//!
//! - [`Identity`]: a resolved account (name, ids, home, shell, groups)
//! - [`Group`]: a group record with its explicit members
//! - [`SessionFrame`]: an identity and working directory saved on elevation
//! - [`SessionStack`]: the ordered chain of saved frames

pub mod session;

pub use session::{SessionFrame, SessionStack, Unwind};

use core_types::{Gid, Uid, ROOT_GID, ROOT_UID};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Login name
    pub username: String,
    /// Numeric user id
    pub uid: Uid,
    /// Primary group id
    pub gid: Gid,
    /// Home directory (absolute)
    pub home: String,
    /// Login shell (absolute)
    pub shell: String,
    /// Names of every group this identity belongs to, primary first
    pub groups: Vec<String>,
}

impl Identity {
    /// Creates an identity with no group names attached yet
    pub fn new(
        username: impl Into<String>,
        uid: Uid,
        gid: Gid,
        home: impl Into<String>,
        shell: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            uid,
            gid,
            home: home.into(),
            shell: shell.into(),
            groups: Vec::new(),
        }
    }

    /// The superuser
    pub fn root() -> Self {
        Self::new("root", ROOT_UID, ROOT_GID, "/root", "/bin/sh").with_groups(["root"])
    }

    /// Sets group names (builder pattern)
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Returns whether this identity is UID 0
    pub fn is_root(&self) -> bool {
        self.uid == ROOT_UID
    }

    /// Returns whether `group` is among this identity's groups
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// Returns whether both values denote the same account
    pub fn same_account(&self, other: &Identity) -> bool {
        self.uid == other.uid && self.username == other.username
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.username, self.uid)
    }
}

/// A group record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub gid: Gid,
    /// Explicitly listed members
    pub members: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, gid: Gid) -> Self {
        Self {
            name: name.into(),
            gid,
            members: Vec::new(),
        }
    }

    /// Sets members (builder pattern)
    pub fn with_members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    /// Returns whether `username` is listed explicitly
    pub fn lists(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }

    /// Returns whether an account with this primary gid belongs here
    ///
    /// Primary-group membership is implied by a matching gid even when the
    /// name is not listed.
    pub fn contains(&self, username: &str, primary_gid: Gid) -> bool {
        self.gid == primary_gid || self.lists(username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_identity() {
        let root = Identity::root();
        assert!(root.is_root());
        assert_eq!(root.home, "/root");
        assert!(root.in_group("root"));
    }

    #[test]
    fn test_regular_identity() {
        let bob = Identity::new("bob", 1000, 1000, "/home/bob", "/bin/sh")
            .with_groups(["bob", "devs"]);
        assert!(!bob.is_root());
        assert!(bob.in_group("devs"));
        assert!(!bob.in_group("wheel"));
        assert_eq!(bob.to_string(), "bob(1000)");
    }

    #[test]
    fn test_root_is_decided_by_uid_not_name() {
        let fake = Identity::new("root", 1001, 1001, "/root", "/bin/sh");
        assert!(!fake.is_root());
        let toor = Identity::new("toor", 0, 0, "/root", "/bin/sh");
        assert!(toor.is_root());
    }

    #[test]
    fn test_group_primary_membership_implied() {
        let devs = Group::new("devs", 1500).with_members(["dave"]);
        assert!(devs.contains("dave", 1000));
        assert!(devs.contains("erin", 1500));
        assert!(!devs.contains("carol", 1000));
        assert!(!devs.lists("erin"));
    }

    #[test]
    fn test_same_account() {
        let a = Identity::new("bob", 1000, 1000, "/home/bob", "/bin/sh");
        let b = a.clone().with_groups(["bob"]);
        assert!(a.same_account(&b));
        assert!(!a.same_account(&Identity::root()));
    }

    #[test]
    fn test_identity_serde() {
        let bob = Identity::new("bob", 1000, 1000, "/home/bob", "/bin/sh").with_groups(["bob"]);
        let json = serde_json::to_string(&bob).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bob);
    }
}
