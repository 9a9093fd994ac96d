//! Filesystem persistence
//!
//! A snapshot is the full path → entry map plus a format version, written as
//! JSON. Loading validates the tree shape so a hand-edited or truncated file
//! can't produce a filesystem with orphaned entries.

use crate::store::FileSystem;
use core_types::Timestamp;
use fs_entry::Entry;
use fs_path::{PathResolver, ROOT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Serializable form of a [`FileSystem`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsSnapshot {
    /// Format version (for future migrations)
    pub version: u32,
    /// Every entry, keyed by canonical absolute path
    pub entries: BTreeMap<String, Entry>,
}

impl FsSnapshot {
    /// Current snapshot format version
    pub const CURRENT_VERSION: u32 = 1;
}

/// Errors that can occur while saving or loading a snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to serialize filesystem: {0}")]
    Serialization(String),

    #[error("Failed to deserialize filesystem: {0}")]
    Deserialization(String),

    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),

    #[error("Snapshot has no root directory")]
    MissingRoot,

    /// An entry whose parent is absent, not a directory, or whose key is not canonical
    #[error("Snapshot entry {0} is not attached to the tree")]
    OrphanedEntry(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FileSystem {
    /// Captures the current state
    pub fn snapshot(&self) -> FsSnapshot {
        FsSnapshot {
            version: FsSnapshot::CURRENT_VERSION,
            entries: self.entries().clone(),
        }
    }

    /// Rebuilds a filesystem from a snapshot, validating its shape
    pub fn from_snapshot(snapshot: FsSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != FsSnapshot::CURRENT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(snapshot.version));
        }
        match snapshot.entries.get(ROOT) {
            Some(root) if root.is_dir() => {}
            _ => return Err(SnapshotError::MissingRoot),
        }
        for path in snapshot.entries.keys() {
            if path == ROOT {
                continue;
            }
            let attached = PathResolver::normalize(path) == *path
                && PathResolver::parent(path)
                    .and_then(|parent| snapshot.entries.get(parent))
                    .map_or(false, Entry::is_dir);
            if !attached {
                return Err(SnapshotError::OrphanedEntry(path.clone()));
            }
        }
        Ok(Self::from_entries(snapshot.entries))
    }

    /// Serializes the filesystem to pretty JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>, SnapshotError> {
        serde_json::to_vec_pretty(&self.snapshot())
            .map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    /// Deserializes and validates a filesystem from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: FsSnapshot = serde_json::from_slice(bytes)
            .map_err(|e| SnapshotError::Deserialization(e.to_string()))?;
        Self::from_snapshot(snapshot)
    }

    /// Loads from bytes, falling back to an empty filesystem on any error
    pub fn load_or_default(bytes: &[u8], now: Timestamp) -> Self {
        Self::from_json(bytes).unwrap_or_else(|err| {
            warn!(error = %err, "discarding unreadable filesystem snapshot");
            Self::new(now)
        })
    }

    /// Writes a snapshot to a host file
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let bytes = self.to_json()?;
        std::fs::write(path.as_ref(), bytes)?;
        info!(path = %path.as_ref().display(), entries = self.len(), "filesystem saved");
        Ok(())
    }

    /// Reads a snapshot from a host file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let bytes = std::fs::read(path.as_ref())?;
        let fs = Self::from_json(&bytes)?;
        info!(path = %path.as_ref().display(), entries = fs.len(), "filesystem loaded");
        Ok(fs)
    }
}
