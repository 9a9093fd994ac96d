//! Access requests and decisions

use fs_entry::{Class, Perm};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability requested on a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    /// Read file content or list a directory
    Read,
    /// Modify file content or the entries of a directory
    Write,
    /// Execute bit; on a directory, permission to pass through it
    Traverse,
    /// Remove the entry from its parent directory
    DeleteWithin,
}

impl Access {
    /// The permission bit checked on the target itself
    ///
    /// `DeleteWithin` is decided on the parent and has no target bit.
    pub fn target_perm(self) -> Option<Perm> {
        match self {
            Access::Read => Some(Perm::Read),
            Access::Write => Some(Perm::Write),
            Access::Traverse => Some(Perm::Execute),
            Access::DeleteWithin => None,
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
            Access::Traverse => write!(f, "traverse"),
            Access::DeleteWithin => write!(f, "delete-within"),
        }
    }
}

/// Why an access was allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grant {
    /// UID 0
    RootOverride,
    /// The consulted triplet held the bit
    Triplet(Class),
    /// Ownership privilege (metadata changes)
    Ownership,
    /// Ancestors allowed passage but the target does not exist yet
    Vacant,
}

impl Grant {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Grant::RootOverride => "root override",
            Grant::Triplet(Class::Owner) => "owner triplet",
            Grant::Triplet(Class::Group) => "group triplet",
            Grant::Triplet(Class::Other) => "other triplet",
            Grant::Ownership => "owner",
            Grant::Vacant => "no entry",
        }
    }
}

/// Why an access was refused
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// The single consulted triplet lacks the requested bit
    MissingPermission { class: Class, perm: Perm },
    /// An ancestor directory lacks the execute bit for the actor
    AncestorNotTraversable { ancestor: String },
    /// The parent directory lacks the write bit for the actor
    ParentNotWritable { class: Class },
    /// Parent is sticky and the actor does not own the target
    StickyNotOwner,
    /// Ownership privilege required
    NotOwner,
    /// The root directory has no parent to be removed from
    RootEntry,
}

impl DenialReason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::MissingPermission { class, perm } => match (class, perm) {
                (Class::Owner, Perm::Read) => "owner triplet lacks read",
                (Class::Owner, Perm::Write) => "owner triplet lacks write",
                (Class::Owner, Perm::Execute) => "owner triplet lacks execute",
                (Class::Group, Perm::Read) => "group triplet lacks read",
                (Class::Group, Perm::Write) => "group triplet lacks write",
                (Class::Group, Perm::Execute) => "group triplet lacks execute",
                (Class::Other, Perm::Read) => "other triplet lacks read",
                (Class::Other, Perm::Write) => "other triplet lacks write",
                (Class::Other, Perm::Execute) => "other triplet lacks execute",
            },
            DenialReason::AncestorNotTraversable { .. } => "ancestor not traversable",
            DenialReason::ParentNotWritable { .. } => "parent not writable",
            DenialReason::StickyNotOwner => "sticky bit: not owner",
            DenialReason::NotOwner => "not owner",
            DenialReason::RootEntry => "root directory",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::AncestorNotTraversable { ancestor } => {
                write!(f, "{} ({})", self.code(), ancestor)
            }
            DenialReason::ParentNotWritable { class } => {
                write!(f, "{} ({} triplet)", self.code(), class)
            }
            _ => f.write_str(self.code()),
        }
    }
}

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed(Grant),
    Denied(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed(_))
    }

    /// Stable code of the grant or denial
    pub fn code(&self) -> &'static str {
        match self {
            Decision::Allowed(grant) => grant.code(),
            Decision::Denied(reason) => reason.code(),
        }
    }

    /// Converts into a `Result` for use with `?`
    pub fn into_result(self) -> Result<Grant, DenialReason> {
        match self {
            Decision::Allowed(grant) => Ok(grant),
            Decision::Denied(reason) => Err(reason),
        }
    }
}
