//! The access-control decision function

use crate::decision::{Access, Decision, DenialReason, Grant};
use fs_entry::{Class, Entry, Perm};
use fs_path::PathResolver;
use identity::Identity;
use std::collections::BTreeMap;

/// Read-only view of the path → entry mapping
pub trait EntryLookup {
    /// Returns the entry stored at a canonical absolute path
    fn entry(&self, path: &str) -> Option<&Entry>;
}

impl EntryLookup for BTreeMap<String, Entry> {
    fn entry(&self, path: &str) -> Option<&Entry> {
        self.get(path)
    }
}

/// Pluggable access-control engine
pub trait AccessPolicy {
    /// Decides whether `actor` may perform `access` on `path`
    ///
    /// `path` must already be canonical. A missing target is not a denial:
    /// once the ancestors allow passage the decision is
    /// `Allowed(Grant::Vacant)` and the caller reports "not found".
    fn check(
        &self,
        actor: &Identity,
        lookup: &dyn EntryLookup,
        path: &str,
        access: Access,
    ) -> Decision;

    /// Decides whether `actor` may change permissions or ownership of `entry`
    fn may_administer(&self, actor: &Identity, entry: &Entry) -> Decision;
}

/// Classic owner/group/other permission semantics
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixPolicy;

impl PosixPolicy {
    /// Selects the single triplet consulted for `actor` on `entry`
    ///
    /// Owner beats group beats other; there is no union across triplets.
    pub fn classify(actor: &Identity, entry: &Entry) -> Class {
        if actor.username == entry.owner {
            Class::Owner
        } else if actor.in_group(&entry.group) {
            Class::Group
        } else {
            Class::Other
        }
    }

    fn permits(actor: &Identity, entry: &Entry, perm: Perm) -> Result<Class, Class> {
        let class = Self::classify(actor, entry);
        if entry.mode.allows(class, perm) {
            Ok(class)
        } else {
            Err(class)
        }
    }

    /// Requires traverse on every existing ancestor, root first
    ///
    /// The walk stops at the first missing or non-directory ancestor: nothing
    /// can exist beneath it, and the caller reports that condition.
    fn check_ancestors(
        actor: &Identity,
        lookup: &dyn EntryLookup,
        path: &str,
    ) -> Result<(), DenialReason> {
        for ancestor in PathResolver::ancestors(path) {
            let entry = match lookup.entry(ancestor) {
                Some(entry) if entry.is_dir() => entry,
                _ => break,
            };
            if Self::permits(actor, entry, Perm::Execute).is_err() {
                return Err(DenialReason::AncestorNotTraversable {
                    ancestor: ancestor.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_delete_within(
        actor: &Identity,
        lookup: &dyn EntryLookup,
        path: &str,
    ) -> Decision {
        let parent_path = match PathResolver::parent(path) {
            Some(parent) => parent,
            None => return Decision::Denied(DenialReason::RootEntry),
        };
        let parent = match lookup.entry(parent_path) {
            Some(parent) => parent,
            None => return Decision::Allowed(Grant::Vacant),
        };

        let class = match Self::permits(actor, parent, Perm::Write) {
            Ok(class) => class,
            Err(class) => return Decision::Denied(DenialReason::ParentNotWritable { class }),
        };

        if parent.mode.is_sticky() {
            if let Some(target) = lookup.entry(path) {
                if target.owner != actor.username {
                    return Decision::Denied(DenialReason::StickyNotOwner);
                }
            }
        }

        Decision::Allowed(Grant::Triplet(class))
    }
}

impl AccessPolicy for PosixPolicy {
    fn check(
        &self,
        actor: &Identity,
        lookup: &dyn EntryLookup,
        path: &str,
        access: Access,
    ) -> Decision {
        if actor.is_root() {
            return Decision::Allowed(Grant::RootOverride);
        }

        if let Err(reason) = Self::check_ancestors(actor, lookup, path) {
            tracing::trace!(actor = %actor, path, %access, code = reason.code(), "ancestor denial");
            return Decision::Denied(reason);
        }

        let perm = match access.target_perm() {
            Some(perm) => perm,
            None => return Self::check_delete_within(actor, lookup, path),
        };

        match lookup.entry(path) {
            None => Decision::Allowed(Grant::Vacant),
            Some(entry) => match Self::permits(actor, entry, perm) {
                Ok(class) => Decision::Allowed(Grant::Triplet(class)),
                Err(class) => Decision::Denied(DenialReason::MissingPermission { class, perm }),
            },
        }
    }

    fn may_administer(&self, actor: &Identity, entry: &Entry) -> Decision {
        if actor.is_root() {
            Decision::Allowed(Grant::RootOverride)
        } else if actor.username == entry.owner {
            Decision::Allowed(Grant::Ownership)
        } else {
            Decision::Denied(DenialReason::NotOwner)
        }
    }
}
