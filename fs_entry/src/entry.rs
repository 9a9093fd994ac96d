//! Entry types

use crate::mode::Mode;
use core_types::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nominal size reported for every directory, regardless of child count
pub const DIRECTORY_SIZE: u64 = 4096;

/// Kind of filesystem node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file with text content
    File,
    /// Directory; children are the entries whose path extends this one
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Directory => write!(f, "directory"),
        }
    }
}

/// A single filesystem node
///
/// Entries carry no path of their own; the path is the key they are stored
/// under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRecord", into = "EntryRecord")]
pub struct Entry {
    /// File or directory
    pub kind: EntryKind,
    /// Text payload; always `None` for directories
    pub content: Option<String>,
    /// Permission bits
    pub mode: Mode,
    /// Owning username
    pub owner: String,
    /// Owning group name
    pub group: String,
    pub created: Timestamp,
    pub modified: Timestamp,
    pub accessed: Timestamp,
    /// Hard-link count
    pub links: u32,
}

impl Entry {
    /// Creates a file entry
    pub fn file(
        content: impl Into<String>,
        owner: impl Into<String>,
        group: impl Into<String>,
        mode: Mode,
        now: Timestamp,
    ) -> Self {
        Self {
            kind: EntryKind::File,
            content: Some(content.into()),
            mode,
            owner: owner.into(),
            group: group.into(),
            created: now,
            modified: now,
            accessed: now,
            links: 1,
        }
    }

    /// Creates a directory entry
    pub fn directory(
        owner: impl Into<String>,
        group: impl Into<String>,
        mode: Mode,
        now: Timestamp,
    ) -> Self {
        Self {
            kind: EntryKind::Directory,
            content: None,
            mode,
            owner: owner.into(),
            group: group.into(),
            created: now,
            modified: now,
            accessed: now,
            links: 2,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Reported size: content length for files, [`DIRECTORY_SIZE`] for directories
    pub fn size(&self) -> u64 {
        match self.kind {
            EntryKind::Directory => DIRECTORY_SIZE,
            EntryKind::File => self.content.as_ref().map_or(0, |c| c.len() as u64),
        }
    }

    /// The 10-character permission descriptor, e.g. `-rw-r-----`
    pub fn descriptor(&self) -> String {
        self.mode.descriptor(self.kind)
    }

    /// Replaces the content and bumps the modification time
    pub fn set_content(&mut self, content: impl Into<String>, now: Timestamp) {
        self.content = Some(content.into());
        self.modified = now;
        self.accessed = now;
    }
}

/// On-disk shape of an entry: permissions as the textual descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryRecord {
    kind: EntryKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default)]
    size: u64,
    permissions: String,
    owner: String,
    group: String,
    #[serde(default)]
    created: Timestamp,
    #[serde(default)]
    modified: Timestamp,
    #[serde(default)]
    accessed: Timestamp,
    #[serde(default = "default_links")]
    links: u32,
}

fn default_links() -> u32 {
    1
}

impl From<Entry> for EntryRecord {
    fn from(entry: Entry) -> Self {
        Self {
            size: entry.size(),
            permissions: entry.descriptor(),
            kind: entry.kind,
            content: entry.content,
            owner: entry.owner,
            group: entry.group,
            created: entry.created,
            modified: entry.modified,
            accessed: entry.accessed,
            links: entry.links,
        }
    }
}

impl From<EntryRecord> for Entry {
    fn from(record: EntryRecord) -> Self {
        let mode = match Mode::decode_lenient(&record.permissions) {
            Some((kind, mode)) => {
                if kind != record.kind {
                    tracing::warn!(
                        descriptor = %record.permissions,
                        kind = %record.kind,
                        "descriptor type marker disagrees with entry kind"
                    );
                }
                mode
            }
            None => Mode::NONE,
        };
        let content = match record.kind {
            EntryKind::File => Some(record.content.unwrap_or_default()),
            EntryKind::Directory => None,
        };
        Self {
            kind: record.kind,
            content,
            mode,
            owner: record.owner,
            group: record.group,
            created: record.created,
            modified: record.modified,
            accessed: record.accessed,
            links: record.links,
        }
    }
}
