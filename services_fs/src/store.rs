//! Flat path-keyed entry storage
//!
//! No permission checks happen here; this is the raw mapping the gateway
//! guards. Mutators are crate-private so every change goes through the
//! gateway.

use core_types::Timestamp;
use fs_entry::{Entry, Mode};
use fs_path::{PathResolver, ROOT};
use policy::EntryLookup;
use std::collections::BTreeMap;

/// The whole filesystem: one entry per canonical absolute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystem {
    entries: BTreeMap<String, Entry>,
}

impl FileSystem {
    /// Creates a filesystem holding only `/`, owned by root with mode 0755
    pub fn new(now: Timestamp) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            ROOT.to_string(),
            Entry::directory("root", "root", Mode::DIR_DEFAULT, now),
        );
        Self { entries }
    }

    pub(crate) fn from_entries(entries: BTreeMap<String, Entry>) -> Self {
        Self { entries }
    }

    /// Gets an entry by path
    pub fn get(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries, including `/`
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All paths in lexical order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, Entry> {
        &self.entries
    }

    pub(crate) fn get_mut(&mut self, path: &str) -> Option<&mut Entry> {
        self.entries.get_mut(path)
    }

    pub(crate) fn insert(&mut self, path: String, entry: Entry) -> Option<Entry> {
        self.entries.insert(path, entry)
    }

    pub(crate) fn remove(&mut self, path: &str) -> Option<Entry> {
        self.entries.remove(path)
    }

    /// `root` and every path beneath it, in lexical order
    ///
    /// Implemented as a range scan over the ordered keys sharing the
    /// `root/` prefix.
    pub fn subtree(&self, root: &str) -> Vec<String> {
        let mut out = Vec::new();
        if self.entries.contains_key(root) {
            out.push(root.to_string());
        }
        let prefix = if root == ROOT {
            ROOT.to_string()
        } else {
            format!("{}/", root)
        };
        for key in self.entries.range(prefix.clone()..).map(|(k, _)| k) {
            if !key.starts_with(&prefix) {
                break;
            }
            if key != root {
                out.push(key.clone());
            }
        }
        out
    }

    /// Direct children of `dir` as `(name, entry)` pairs
    pub fn children(&self, dir: &str) -> Vec<(String, &Entry)> {
        self.subtree(dir)
            .into_iter()
            .filter(|path| PathResolver::parent(path) == Some(dir))
            .filter_map(|path| {
                let entry = self.entries.get(&path)?;
                let name = PathResolver::file_name(&path)?.to_string();
                Some((name, entry))
            })
            .collect()
    }
}

impl EntryLookup for FileSystem {
    fn entry(&self, path: &str) -> Option<&Entry> {
        self.entries.get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileSystem {
        let now = Timestamp::EPOCH;
        let mut fs = FileSystem::new(now);
        for dir in ["/tmp", "/tmp/a", "/tmp-x", "/tmp.d", "/tmp0"] {
            fs.insert(
                dir.to_string(),
                Entry::directory("root", "root", Mode::DIR_DEFAULT, now),
            );
        }
        fs.insert(
            "/tmp/a/file".to_string(),
            Entry::file("x", "root", "root", Mode::FILE_DEFAULT, now),
        );
        fs.insert(
            "/tmp/b".to_string(),
            Entry::file("y", "root", "root", Mode::FILE_DEFAULT, now),
        );
        fs
    }

    #[test]
    fn test_new_has_root() {
        let fs = FileSystem::new(Timestamp::EPOCH);
        assert_eq!(fs.len(), 1);
        assert!(fs.get("/").map(Entry::is_dir).unwrap_or(false));
    }

    #[test]
    fn test_subtree_respects_component_boundaries() {
        let fs = sample();
        assert_eq!(
            fs.subtree("/tmp"),
            vec!["/tmp", "/tmp/a", "/tmp/a/file", "/tmp/b"]
        );
    }

    #[test]
    fn test_subtree_of_root_is_everything() {
        let fs = sample();
        assert_eq!(fs.subtree("/").len(), fs.len());
    }

    #[test]
    fn test_subtree_of_missing_path() {
        let fs = sample();
        assert!(fs.subtree("/nope").is_empty());
    }

    #[test]
    fn test_children_are_direct_only() {
        let fs = sample();
        let names: Vec<String> = fs.children("/tmp").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);

        let top: Vec<String> = fs.children("/").into_iter().map(|(n, _)| n).collect();
        assert_eq!(top, vec!["tmp", "tmp-x", "tmp.d", "tmp0"]);
    }
}
