//! Checked access to the filesystem
//!
//! A [`Gateway`] binds the filesystem to one acting identity and one clock
//! for the duration of a command. It is cheap to build; build a fresh one
//! whenever the acting identity changes.

use crate::error::{FsError, FsResult};
use crate::store::FileSystem;
use core_types::Clock;
use fs_entry::{Entry, EntryKind, Mode};
use fs_path::{PathResolver, ROOT};
use identity::Identity;
use policy::{Access, AccessPolicy, Decision, DenialReason, Grant, PosixPolicy};
use tracing::{debug, trace};

/// What [`Gateway::store`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Created,
    Updated,
}

/// How [`Gateway::write_content`] treats existing content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Truncate,
    Append,
}

/// The filesystem as seen by one acting identity
pub struct Gateway<'a, P: AccessPolicy = PosixPolicy> {
    fs: &'a mut FileSystem,
    actor: &'a Identity,
    clock: &'a dyn Clock,
    policy: P,
}

impl<'a> Gateway<'a> {
    /// Creates a gateway using the POSIX policy
    pub fn new(fs: &'a mut FileSystem, actor: &'a Identity, clock: &'a dyn Clock) -> Self {
        Self::with_policy(fs, actor, clock, PosixPolicy)
    }
}

impl<'a, P: AccessPolicy> Gateway<'a, P> {
    /// Creates a gateway using a custom policy
    pub fn with_policy(
        fs: &'a mut FileSystem,
        actor: &'a Identity,
        clock: &'a dyn Clock,
        policy: P,
    ) -> Self {
        Self {
            fs,
            actor,
            clock,
            policy,
        }
    }

    /// The acting identity
    pub fn actor(&self) -> &Identity {
        self.actor
    }

    /// Read-only view of the underlying filesystem
    pub fn filesystem(&self) -> &FileSystem {
        &*self.fs
    }

    /// Runs the access-control engine without touching storage
    pub fn check(&self, path: &str, access: Access) -> Decision {
        self.policy.check(self.actor, &*self.fs, path, access)
    }

    fn authorize(&self, path: &str, access: Access) -> FsResult<Grant> {
        self.check(path, access)
            .into_result()
            .map_err(|reason| self.denied(path, reason, access))
    }

    fn denied(&self, path: &str, reason: DenialReason, access: Access) -> FsError {
        debug!(actor = %self.actor, path, %access, code = reason.code(), "access denied");
        FsError::PermissionDenied {
            path: path.to_string(),
            reason,
        }
    }

    /// Confirms every ancestor of `path` exists and is a directory
    fn ensure_ancestors(&self, path: &str) -> FsResult<()> {
        for ancestor in PathResolver::ancestors(path) {
            match self.fs.get(ancestor) {
                None => return Err(FsError::NotFound(path.to_string())),
                Some(entry) if !entry.is_dir() => {
                    return Err(FsError::NotADirectory(ancestor.to_string()))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Requires traverse on the whole chain above `path`
    fn authorize_passage(&self, path: &str) -> FsResult<()> {
        if let Some(parent) = PathResolver::parent(path) {
            self.authorize(parent, Access::Traverse)?;
        }
        Ok(())
    }

    fn primary_group(&self) -> String {
        self.actor
            .groups
            .first()
            .cloned()
            .unwrap_or_else(|| self.actor.username.clone())
    }

    fn validate(path: &str) -> FsResult<()> {
        if !path.starts_with('/') || PathResolver::normalize(path) != path {
            return Err(FsError::InvalidPath(path.to_string()));
        }
        if let Some(name) = PathResolver::file_name(path) {
            if !PathResolver::is_valid_name(name) {
                return Err(FsError::InvalidPath(path.to_string()));
            }
        }
        Ok(())
    }

    fn adjust_parent(&mut self, path: &str, now: core_types::Timestamp, link_delta: i64) {
        if let Some(parent) = PathResolver::parent(path) {
            if let Some(entry) = self.fs.get_mut(parent) {
                entry.modified = now;
                let links = i64::from(entry.links) + link_delta;
                entry.links = u32::try_from(links.max(2)).unwrap_or(u32::MAX);
            }
        }
    }

    // ------------------------------------------------------------------
    // Primitives
    // ------------------------------------------------------------------

    /// Checked read of the entry at `path`
    ///
    /// The returned copy of a file has its accessed time set to now; call
    /// [`touch`](Self::touch) to commit that.
    pub fn fetch(&self, path: &str, access: Access) -> FsResult<Entry> {
        Self::validate(path)?;
        self.authorize(path, access)?;
        self.ensure_ancestors(path)?;
        let mut entry = self
            .fs
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        if entry.is_file() {
            entry.accessed = self.clock.now();
        }
        trace!(actor = %self.actor, path, %access, "fetch");
        Ok(entry)
    }

    /// Creates or updates the entry at `path`
    ///
    /// Creating requires write and traverse on the parent directory. Updating
    /// requires the actor to own the entry or be root, regardless of rwx bits,
    /// and can never change the entry's kind.
    pub fn store(&mut self, path: &str, entry: Entry) -> FsResult<StoreOutcome> {
        Self::validate(path)?;
        if !self.fs.contains(path) {
            self.create(path, entry)?;
            return Ok(StoreOutcome::Created);
        }

        self.authorize_passage(path)?;
        self.ensure_ancestors(path)?;
        let existing = self
            .fs
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;

        if existing.kind != entry.kind {
            return Err(FsError::TypeMismatch {
                path: path.to_string(),
                existing: existing.kind,
                requested: entry.kind,
            });
        }

        if let Decision::Denied(reason) = self.policy.may_administer(self.actor, &existing) {
            return Err(self.denied(path, reason, Access::Write));
        }

        let mut updated = entry;
        updated.created = existing.created;
        if updated.content != existing.content {
            updated.modified = self.clock.now();
        }
        self.fs.insert(path.to_string(), updated);
        debug!(actor = %self.actor, path, "entry updated");
        Ok(StoreOutcome::Updated)
    }

    /// Removes `path` and, for a directory, its whole subtree
    ///
    /// Every descendant is checked before anything is deleted. Returns the
    /// number of entries removed.
    pub fn remove(&mut self, path: &str) -> FsResult<usize> {
        Self::validate(path)?;
        if path == ROOT {
            return Err(self.denied(path, DenialReason::RootEntry, Access::DeleteWithin));
        }
        self.authorize(path, Access::DeleteWithin)?;
        self.ensure_ancestors(path)?;
        let is_dir = match self.fs.get(path) {
            Some(entry) => entry.is_dir(),
            None => return Err(FsError::NotFound(path.to_string())),
        };

        let doomed = self.fs.subtree(path);
        for descendant in doomed.iter().skip(1) {
            self.authorize(descendant, Access::DeleteWithin)?;
        }

        for victim in &doomed {
            self.fs.remove(victim);
        }
        let now = self.clock.now();
        self.adjust_parent(path, now, if is_dir { -1 } else { 0 });
        debug!(actor = %self.actor, path, removed = doomed.len(), "removed");
        Ok(doomed.len())
    }

    // ------------------------------------------------------------------
    // Derived operations
    // ------------------------------------------------------------------

    /// Creates a new entry, failing if `path` is taken
    ///
    /// A non-root actor always becomes the owner, and keeps the requested
    /// group only if it belongs to it.
    pub fn create(&mut self, path: &str, entry: Entry) -> FsResult<()> {
        Self::validate(path)?;
        let parent = match PathResolver::parent(path) {
            Some(parent) => parent,
            None => return Err(FsError::AlreadyExists(path.to_string())),
        };

        self.authorize(parent, Access::Traverse)?;
        self.authorize(parent, Access::Write)?;
        self.ensure_ancestors(path)?;
        match self.fs.get(parent) {
            None => return Err(FsError::NotFound(parent.to_string())),
            Some(p) if !p.is_dir() => return Err(FsError::NotADirectory(parent.to_string())),
            Some(_) => {}
        }
        if self.fs.contains(path) {
            return Err(FsError::AlreadyExists(path.to_string()));
        }

        let now = self.clock.now();
        let mut entry = entry;
        if !self.actor.is_root() {
            entry.owner = self.actor.username.clone();
            if !self.actor.in_group(&entry.group) {
                entry.group = self.primary_group();
            }
        }
        entry.created = now;
        entry.modified = now;
        entry.accessed = now;
        let is_dir = entry.is_dir();
        self.fs.insert(path.to_string(), entry);
        self.adjust_parent(path, now, if is_dir { 1 } else { 0 });
        debug!(actor = %self.actor, path, dir = is_dir, "created");
        Ok(())
    }

    /// Reads the text content of a file
    pub fn read_content(&self, path: &str) -> FsResult<String> {
        let entry = self.fetch(path, Access::Read)?;
        match entry.kind {
            EntryKind::Directory => Err(FsError::IsADirectory(path.to_string())),
            EntryKind::File => Ok(entry.content.unwrap_or_default()),
        }
    }

    /// Writes file content, creating the file if it does not exist
    ///
    /// Unlike [`store`](Self::store), this is governed by the write bit of
    /// the consulted triplet.
    pub fn write_content(&mut self, path: &str, content: &str, mode: WriteMode) -> FsResult<()> {
        Self::validate(path)?;
        if !self.fs.contains(path) {
            let entry = Entry::file(
                content,
                self.actor.username.clone(),
                self.primary_group(),
                Mode::FILE_DEFAULT,
                self.clock.now(),
            );
            return self.create(path, entry);
        }

        self.authorize(path, Access::Write)?;
        self.ensure_ancestors(path)?;
        let now = self.clock.now();
        let entry = self
            .fs
            .get_mut(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        if entry.is_dir() {
            return Err(FsError::IsADirectory(path.to_string()));
        }
        let next = match mode {
            WriteMode::Truncate => content.to_string(),
            WriteMode::Append => {
                let mut existing = entry.content.take().unwrap_or_default();
                existing.push_str(content);
                existing
            }
        };
        entry.set_content(next, now);
        Ok(())
    }

    /// Lists a directory as `(name, entry)` pairs in name order
    pub fn list(&self, path: &str) -> FsResult<Vec<(String, Entry)>> {
        let entry = self.fetch(path, Access::Read)?;
        if !entry.is_dir() {
            return Err(FsError::NotADirectory(path.to_string()));
        }
        Ok(self
            .fs
            .children(path)
            .into_iter()
            .map(|(name, child)| (name, child.clone()))
            .collect())
    }

    /// Creates a single directory owned by the actor
    pub fn make_dir(&mut self, path: &str, mode: Mode) -> FsResult<()> {
        let entry = Entry::directory(
            self.actor.username.clone(),
            self.primary_group(),
            mode,
            self.clock.now(),
        );
        self.create(path, entry)
    }

    /// Creates `path` and any missing ancestors, all with `mode`
    pub fn make_dirs(&mut self, path: &str, mode: Mode) -> FsResult<()> {
        Self::validate(path)?;
        let mut targets: Vec<String> = PathResolver::ancestors(path)
            .into_iter()
            .map(str::to_string)
            .collect();
        targets.push(path.to_string());

        for dir in targets {
            match self.fs.get(&dir) {
                Some(entry) if entry.is_dir() => continue,
                Some(_) => return Err(FsError::NotADirectory(dir)),
                None => self.make_dir(&dir, mode)?,
            }
        }
        Ok(())
    }

    /// Changes permission bits; owner or root only
    pub fn chmod(&mut self, path: &str, mode: Mode) -> FsResult<()> {
        let mut entry = self.existing_for_update(path)?;
        entry.mode = mode;
        self.store(path, entry).map(|_| ())
    }

    /// Changes owner and/or group; owner or root only
    pub fn chown(&mut self, path: &str, owner: Option<&str>, group: Option<&str>) -> FsResult<()> {
        let mut entry = self.existing_for_update(path)?;
        if let Some(owner) = owner {
            entry.owner = owner.to_string();
        }
        if let Some(group) = group {
            entry.group = group.to_string();
        }
        self.store(path, entry).map(|_| ())
    }

    fn existing_for_update(&self, path: &str) -> FsResult<Entry> {
        Self::validate(path)?;
        self.authorize_passage(path)?;
        self.ensure_ancestors(path)?;
        self.fs
            .get(path)
            .cloned()
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    /// Commits the accessed time of a readable entry
    pub fn touch(&mut self, path: &str) -> FsResult<()> {
        self.fetch(path, Access::Read)?;
        let now = self.clock.now();
        if let Some(entry) = self.fs.get_mut(path) {
            entry.accessed = now;
        }
        Ok(())
    }

    /// Returns whether `path` exists and its ancestors can be traversed
    pub fn exists(&self, path: &str) -> bool {
        if Self::validate(path).is_err() {
            return false;
        }
        let passable = match PathResolver::parent(path) {
            Some(parent) => self.check(parent, Access::Traverse).is_allowed(),
            None => true,
        };
        passable && self.fs.contains(path)
    }

    /// Moves `from` (and its subtree) to exactly `to`
    ///
    /// The destination may be replaced if it has the same kind and, for
    /// directories, is empty.
    pub fn rename(&mut self, from: &str, to: &str) -> FsResult<()> {
        Self::validate(from)?;
        Self::validate(to)?;
        if from == ROOT {
            return Err(self.denied(from, DenialReason::RootEntry, Access::DeleteWithin));
        }
        if from == to {
            return Ok(());
        }
        if PathResolver::is_within(to, from) {
            return Err(FsError::InvalidMove {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.authorize(from, Access::DeleteWithin)?;
        self.ensure_ancestors(from)?;
        let moving_dir = match self.fs.get(from) {
            Some(entry) => entry.is_dir(),
            None => return Err(FsError::NotFound(from.to_string())),
        };
        let now = self.clock.now();

        let to_parent = PathResolver::parent(to).unwrap_or(ROOT);
        self.authorize(to_parent, Access::Traverse)?;
        self.authorize(to_parent, Access::Write)?;
        self.ensure_ancestors(to)?;
        match self.fs.get(to_parent) {
            None => return Err(FsError::NotFound(to_parent.to_string())),
            Some(p) if !p.is_dir() => return Err(FsError::NotADirectory(to_parent.to_string())),
            Some(_) => {}
        }

        if let Some(existing) = self.fs.get(to) {
            match (moving_dir, existing.is_dir()) {
                (false, true) => return Err(FsError::IsADirectory(to.to_string())),
                (true, false) => return Err(FsError::NotADirectory(to.to_string())),
                (true, true) if self.fs.subtree(to).len() > 1 => {
                    return Err(FsError::NotEmpty(to.to_string()))
                }
                _ => {}
            }
            self.authorize(to, Access::DeleteWithin)?;
            self.fs.remove(to);
            if moving_dir {
                self.adjust_parent(to, now, -1);
            }
        }

        let moving = self.fs.subtree(from);
        for old in &moving {
            if let Some(entry) = self.fs.remove(old) {
                let new_path = format!("{}{}", to, &old[from.len()..]);
                self.fs.insert(new_path, entry);
            }
        }
        let delta = if moving_dir { 1 } else { 0 };
        self.adjust_parent(from, now, -delta);
        self.adjust_parent(to, now, delta);
        debug!(actor = %self.actor, from, to, moved = moving.len(), "renamed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{ManualClock, Timestamp};
    use std::time::Duration;

    fn user(name: &str, uid: u32) -> Identity {
        Identity::new(name, uid, uid, format!("/home/{}", name), "/bin/sh").with_groups([name])
    }

    fn setup() -> (FileSystem, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_millis(1_000));
        let mut fs = FileSystem::new(clock.now());
        let root = Identity::root();
        {
            let mut gw = Gateway::new(&mut fs, &root, &clock);
            gw.make_dir("/home", Mode::DIR_DEFAULT).unwrap();
            gw.make_dir("/home/bob", Mode::DIR_DEFAULT).unwrap();
            gw.chown("/home/bob", Some("bob"), Some("bob")).unwrap();
            gw.make_dir("/tmp", Mode::from_octal(0o1777).unwrap()).unwrap();
        }
        (fs, clock)
    }

    #[test]
    fn test_fetch_missing_is_not_found() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let gw = Gateway::new(&mut fs, &bob, &clock);
        assert_eq!(
            gw.fetch("/home/bob/none", Access::Read),
            Err(FsError::NotFound("/home/bob/none".to_string()))
        );
    }

    #[test]
    fn test_fetch_marks_accessed_on_copy_only() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        gw.write_content("/home/bob/a.txt", "hi", WriteMode::Truncate)
            .unwrap();
        clock.advance(Duration::from_secs(5));

        let fetched = gw.fetch("/home/bob/a.txt", Access::Read).unwrap();
        assert_eq!(fetched.accessed.as_millis(), 6_000);
        let stored = gw.filesystem().get("/home/bob/a.txt").unwrap();
        assert_eq!(stored.accessed.as_millis(), 1_000);

        gw.touch("/home/bob/a.txt").unwrap();
        let stored = gw.filesystem().get("/home/bob/a.txt").unwrap();
        assert_eq!(stored.accessed.as_millis(), 6_000);
    }

    #[test]
    fn test_through_file_is_not_a_directory() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        gw.write_content("/home/bob/a.txt", "hi", WriteMode::Truncate)
            .unwrap();
        assert_eq!(
            gw.fetch("/home/bob/a.txt/inner", Access::Read),
            Err(FsError::NotADirectory("/home/bob/a.txt".to_string()))
        );
    }

    #[test]
    fn test_create_collision() {
        let (mut fs, clock) = setup();
        let root = Identity::root();
        let mut gw = Gateway::new(&mut fs, &root, &clock);
        assert_eq!(
            gw.make_dir("/tmp", Mode::DIR_DEFAULT),
            Err(FsError::AlreadyExists("/tmp".to_string()))
        );
        assert_eq!(
            gw.make_dir("/", Mode::DIR_DEFAULT),
            Err(FsError::AlreadyExists("/".to_string()))
        );
    }

    #[test]
    fn test_create_requires_parent_write() {
        let (mut fs, clock) = setup();
        let eve = user("eve", 1004);
        let mut gw = Gateway::new(&mut fs, &eve, &clock);
        let err = gw
            .write_content("/home/bob/x", "hi", WriteMode::Truncate)
            .unwrap_err();
        assert_eq!(
            err.reason().map(DenialReason::code),
            Some("other triplet lacks write")
        );
        assert!(!gw.filesystem().contains("/home/bob/x"));
    }

    #[test]
    fn test_create_in_missing_parent() {
        let (mut fs, clock) = setup();
        let root = Identity::root();
        let mut gw = Gateway::new(&mut fs, &root, &clock);
        assert_eq!(
            gw.make_dir("/nope/deeper", Mode::DIR_DEFAULT),
            Err(FsError::NotFound("/nope/deeper".to_string()))
        );
    }

    #[test]
    fn test_non_root_cannot_forge_owner() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        let forged = Entry::file("x", "root", "root", Mode::FILE_DEFAULT, clock.now());
        gw.create("/tmp/forged", forged).unwrap();
        let stored = gw.filesystem().get("/tmp/forged").unwrap();
        assert_eq!(stored.owner, "bob");
        assert_eq!(stored.group, "bob");
    }

    #[test]
    fn test_store_update_kind_change_rejected() {
        let (mut fs, clock) = setup();
        let root = Identity::root();
        let mut gw = Gateway::new(&mut fs, &root, &clock);
        let file = Entry::file("", "root", "root", Mode::FILE_DEFAULT, clock.now());
        assert_eq!(
            gw.store("/tmp", file),
            Err(FsError::TypeMismatch {
                path: "/tmp".to_string(),
                existing: EntryKind::Directory,
                requested: EntryKind::File,
            })
        );
    }

    #[test]
    fn test_store_update_requires_owner() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let dave = user("dave", 1003);
        {
            let mut gw = Gateway::new(&mut fs, &bob, &clock);
            gw.write_content("/tmp/shared", "v1", WriteMode::Truncate)
                .unwrap();
            gw.chmod("/tmp/shared", Mode::from_octal(0o666).unwrap())
                .unwrap();
        }

        let mut gw = Gateway::new(&mut fs, &dave, &clock);
        // the write bit lets dave write content...
        gw.write_content("/tmp/shared", "v2", WriteMode::Truncate)
            .unwrap();
        // ...but not change permissions or replace the entry
        let err = gw.chmod("/tmp/shared", Mode::from_octal(0o777).unwrap()).unwrap_err();
        assert_eq!(err.reason(), Some(&DenialReason::NotOwner));

        let mut replacement = gw.fetch("/tmp/shared", Access::Read).unwrap();
        replacement.content = Some("v3".to_string());
        assert!(gw.store("/tmp/shared", replacement).unwrap_err().is_permission_denied());
        assert_eq!(gw.read_content("/tmp/shared").unwrap(), "v2");
    }

    #[test]
    fn test_store_update_by_owner_keeps_created() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        gw.write_content("/home/bob/n", "a", WriteMode::Truncate).unwrap();
        clock.advance(Duration::from_secs(60));

        let mut entry = gw.fetch("/home/bob/n", Access::Read).unwrap();
        entry.content = Some("b".to_string());
        entry.created = Timestamp::EPOCH;
        assert_eq!(gw.store("/home/bob/n", entry), Ok(StoreOutcome::Updated));

        let stored = gw.filesystem().get("/home/bob/n").unwrap();
        assert_eq!(stored.created.as_millis(), 1_000);
        assert_eq!(stored.modified.as_millis(), 61_000);
    }

    #[test]
    fn test_append() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        gw.write_content("/home/bob/log", "a\n", WriteMode::Append).unwrap();
        gw.write_content("/home/bob/log", "b\n", WriteMode::Append).unwrap();
        assert_eq!(gw.read_content("/home/bob/log").unwrap(), "a\nb\n");
    }

    #[test]
    fn test_read_directory_content_is_error() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        assert_eq!(
            gw.read_content("/home"),
            Err(FsError::IsADirectory("/home".to_string()))
        );
        assert_eq!(
            gw.write_content("/home/bob", "x", WriteMode::Truncate),
            Err(FsError::IsADirectory("/home/bob".to_string()))
        );
    }

    #[test]
    fn test_list() {
        let (mut fs, clock) = setup();
        let root = Identity::root();
        let gw = Gateway::new(&mut fs, &root, &clock);
        let names: Vec<String> = gw.list("/").unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["home", "tmp"]);
        assert_eq!(
            gw.list("/home/bob/missing"),
            Err(FsError::NotFound("/home/bob/missing".to_string()))
        );
    }

    #[test]
    fn test_remove_file_and_directory_links() {
        let (mut fs, clock) = setup();
        let root = Identity::root();
        let mut gw = Gateway::new(&mut fs, &root, &clock);
        assert_eq!(gw.filesystem().get("/home").unwrap().links, 3);
        gw.make_dir("/home/bob/sub", Mode::DIR_DEFAULT).unwrap();
        gw.write_content("/home/bob/sub/f", "x", WriteMode::Truncate).unwrap();

        assert_eq!(gw.remove("/home/bob"), Ok(3));
        assert!(!gw.filesystem().contains("/home/bob/sub/f"));
        assert_eq!(gw.filesystem().get("/home").unwrap().links, 2);
    }

    #[test]
    fn test_remove_root_denied() {
        let (mut fs, clock) = setup();
        let root = Identity::root();
        let mut gw = Gateway::new(&mut fs, &root, &clock);
        assert_eq!(
            gw.remove("/").unwrap_err().reason(),
            Some(&DenialReason::RootEntry)
        );
    }

    #[test]
    fn test_make_dirs() {
        let (mut fs, clock) = setup();
        let root = Identity::root();
        let mut gw = Gateway::new(&mut fs, &root, &clock);
        gw.make_dirs("/var/run/sudo/ts", Mode::OWNER_ONLY).unwrap();
        for dir in ["/var", "/var/run", "/var/run/sudo", "/var/run/sudo/ts"] {
            let entry = gw.filesystem().get(dir).unwrap();
            assert_eq!(entry.descriptor(), "drwx------");
        }
        // idempotent
        gw.make_dirs("/var/run/sudo/ts", Mode::OWNER_ONLY).unwrap();
    }

    #[test]
    fn test_invalid_paths_rejected() {
        let (mut fs, clock) = setup();
        let root = Identity::root();
        let gw = Gateway::new(&mut fs, &root, &clock);
        assert!(matches!(
            gw.fetch("relative", Access::Read),
            Err(FsError::InvalidPath(_))
        ));
        assert!(matches!(
            gw.fetch("/tmp/../etc", Access::Read),
            Err(FsError::InvalidPath(_))
        ));
        assert!(!gw.exists("/tmp/"));
    }

    #[test]
    fn test_rename_moves_subtree() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        gw.make_dir("/home/bob/src", Mode::DIR_DEFAULT).unwrap();
        gw.write_content("/home/bob/src/main.rs", "fn main() {}", WriteMode::Truncate)
            .unwrap();

        gw.rename("/home/bob/src", "/home/bob/code").unwrap();
        assert!(!gw.exists("/home/bob/src"));
        assert_eq!(
            gw.read_content("/home/bob/code/main.rs").unwrap(),
            "fn main() {}"
        );
    }

    #[test]
    fn test_rename_into_itself_rejected() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        gw.make_dir("/home/bob/a", Mode::DIR_DEFAULT).unwrap();
        assert!(matches!(
            gw.rename("/home/bob/a", "/home/bob/a/b"),
            Err(FsError::InvalidMove { .. })
        ));
    }

    #[test]
    fn test_rename_kind_conflicts() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        gw.make_dir("/home/bob/d", Mode::DIR_DEFAULT).unwrap();
        gw.write_content("/home/bob/f", "x", WriteMode::Truncate).unwrap();
        assert_eq!(
            gw.rename("/home/bob/f", "/home/bob/d"),
            Err(FsError::IsADirectory("/home/bob/d".to_string()))
        );
        assert_eq!(
            gw.rename("/home/bob/d", "/home/bob/f"),
            Err(FsError::NotADirectory("/home/bob/f".to_string()))
        );
    }

    #[test]
    fn test_rename_replaces_file() {
        let (mut fs, clock) = setup();
        let bob = user("bob", 1000);
        let mut gw = Gateway::new(&mut fs, &bob, &clock);
        gw.write_content("/home/bob/old", "new data", WriteMode::Truncate).unwrap();
        gw.write_content("/home/bob/target", "stale", WriteMode::Truncate).unwrap();
        gw.rename("/home/bob/old", "/home/bob/target").unwrap();
        assert_eq!(gw.read_content("/home/bob/target").unwrap(), "new data");
        assert!(!gw.exists("/home/bob/old"));
    }
}
