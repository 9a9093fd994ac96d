//! Account, group and credential records

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::records::{AccountRecord, CredentialState, Record, ShadowRecord, Table};
use crate::secret::encode_secret;
use core_types::{Clock, Gid, Uid};
use fs_entry::{Entry, Mode};
use fs_path::PathResolver;
use identity::{Group, Identity};
use services_fs::{FileSystem, FsError, Gateway, WriteMode};
use tracing::{debug, info};

/// First id handed out to regular accounts and groups
pub const FIRST_REGULAR_ID: u32 = 1000;

/// Reads and rewrites the record files on behalf of the system
///
/// The store acts through the gateway as root; callers decide whether the
/// human operator is allowed to trigger a given mutation.
pub struct CredentialStore<'a> {
    fs: &'a mut FileSystem,
    clock: &'a dyn Clock,
    config: &'a AuthConfig,
    system: Identity,
}

impl<'a> CredentialStore<'a> {
    pub fn new(fs: &'a mut FileSystem, clock: &'a dyn Clock, config: &'a AuthConfig) -> Self {
        Self {
            fs,
            clock,
            config,
            system: Identity::root(),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        self.config
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock
    }

    /// Gateway acting as the system identity
    pub(crate) fn gateway(&mut self) -> Gateway<'_> {
        Gateway::new(&mut *self.fs, &self.system, self.clock)
    }

    fn read_table<R: Record>(&mut self, path: &str) -> AuthResult<Table<R>> {
        match self.gateway().read_content(path) {
            Ok(text) => Ok(Table::parse(&text)),
            Err(FsError::NotFound(_)) => Ok(Table::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_table<R: Record>(&mut self, path: &str, table: &Table<R>, mode: Mode) -> AuthResult<()> {
        let text = table.render();
        let now = self.clock.now();
        let mut gateway = self.gateway();
        if gateway.exists(path) {
            gateway.write_content(path, &text, WriteMode::Truncate)?;
        } else {
            gateway.create(path, Entry::file(text, "root", "root", mode, now))?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Raw tables
    // ------------------------------------------------------------------

    pub fn accounts(&mut self) -> AuthResult<Vec<AccountRecord>> {
        Ok(self.account_table()?.into_records())
    }

    pub fn groups(&mut self) -> AuthResult<Vec<Group>> {
        Ok(self.group_table()?.into_records())
    }

    fn account_table(&mut self) -> AuthResult<Table<AccountRecord>> {
        let path = self.config.passwd_path.clone();
        self.read_table(&path)
    }

    fn group_table(&mut self) -> AuthResult<Table<Group>> {
        let path = self.config.group_path.clone();
        self.read_table(&path)
    }

    fn shadow_table(&mut self) -> AuthResult<Table<ShadowRecord>> {
        let path = self.config.shadow_path.clone();
        self.read_table(&path)
    }

    fn save_accounts(&mut self, table: &Table<AccountRecord>) -> AuthResult<()> {
        let path = self.config.passwd_path.clone();
        self.write_table(&path, table, Mode::FILE_DEFAULT)
    }

    fn save_groups(&mut self, table: &Table<Group>) -> AuthResult<()> {
        let path = self.config.group_path.clone();
        self.write_table(&path, table, Mode::FILE_DEFAULT)
    }

    fn save_shadows(&mut self, table: &Table<ShadowRecord>) -> AuthResult<()> {
        let path = self.config.shadow_path.clone();
        self.write_table(&path, table, Mode::PRIVATE_FILE)
    }

    // ------------------------------------------------------------------
    // Identity resolution
    // ------------------------------------------------------------------

    /// Resolves a username to an identity with its group names attached
    ///
    /// The primary group comes first, followed by every group that lists
    /// the user.
    pub fn resolve_identity(&mut self, username: &str) -> AuthResult<Identity> {
        let account = self
            .accounts()?
            .into_iter()
            .find(|account| account.username == username)
            .ok_or_else(|| AuthError::IdentityNotFound(username.to_string()))?;
        self.identity_from(account)
    }

    pub fn identity_by_uid(&mut self, uid: Uid) -> AuthResult<Identity> {
        let account = self
            .accounts()?
            .into_iter()
            .find(|account| account.uid == uid)
            .ok_or_else(|| AuthError::IdentityNotFound(uid.to_string()))?;
        self.identity_from(account)
    }

    /// Group names of `username`, primary first
    pub fn groups_of(&mut self, username: &str) -> AuthResult<Vec<String>> {
        Ok(self.resolve_identity(username)?.groups)
    }

    fn identity_from(&mut self, account: AccountRecord) -> AuthResult<Identity> {
        let groups = self.groups()?;
        let mut names: Vec<String> = groups
            .iter()
            .filter(|group| group.gid == account.gid)
            .take(1)
            .map(|group| group.name.clone())
            .collect();
        for group in &groups {
            if group.contains(&account.username, account.gid) && !names.contains(&group.name) {
                names.push(group.name.clone());
            }
        }
        Ok(
            Identity::new(account.username, account.uid, account.gid, account.home, account.shell)
                .with_groups(names),
        )
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    /// The decoded credential of `username`
    ///
    /// An account without a credential record reports `IdentityNotFound`.
    pub fn credential_state(&mut self, username: &str) -> AuthResult<CredentialState> {
        self.shadow_table()?
            .find(username)
            .map(|record| record.credential.clone())
            .ok_or_else(|| AuthError::IdentityNotFound(username.to_string()))
    }

    /// Checks a presented secret against the stored credential
    ///
    /// Empty and locked credentials never verify, whatever is presented.
    pub fn verify_credential(&mut self, username: &str, presented: &str) -> bool {
        let verified = match self.credential_state(username) {
            Ok(CredentialState::Set(stored)) => stored == encode_secret(presented),
            Ok(_) => false,
            Err(err) => {
                debug!(username, error = %err, "no usable credential");
                false
            }
        };
        if !verified {
            info!(username, "authentication failure");
        }
        verified
    }

    /// Replaces the credential of `username`; an empty secret means "no password"
    pub fn set_credential(&mut self, username: &str, secret: &str) -> AuthResult<()> {
        let credential = if secret.is_empty() {
            CredentialState::Empty
        } else {
            CredentialState::Set(encode_secret(secret))
        };
        self.replace_credential(username, credential)?;
        info!(username, "credential changed");
        Ok(())
    }

    /// Locks the account so no secret can authenticate it
    pub fn lock_account(&mut self, username: &str) -> AuthResult<()> {
        let locked = self.credential_state(username)?.locked();
        self.replace_credential(username, locked)?;
        info!(username, "account locked");
        Ok(())
    }

    fn replace_credential(&mut self, username: &str, credential: CredentialState) -> AuthResult<()> {
        if self.account_table()?.find(username).is_none() {
            return Err(AuthError::IdentityNotFound(username.to_string()));
        }
        let today = self.clock.now().as_days();
        let mut shadows = self.shadow_table()?;
        let updated = shadows.update(username, |record| {
            record.credential = credential.clone();
            record.last_change = Some(today);
        });
        if !updated {
            shadows.push(ShadowRecord::new(username, credential, today));
        }
        self.save_shadows(&shadows)
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Adds an account, its primary group, credential record and home directory
    ///
    /// The home directory is owned by the new account with mode `drwx------`.
    pub fn create_account(&mut self, username: &str, secret: Option<&str>) -> AuthResult<Identity> {
        validate_name(username)?;
        let mut accounts = self.account_table()?;
        if accounts.find(username).is_some() {
            return Err(AuthError::AlreadyExists(username.to_string()));
        }

        let uid = next_id(accounts.records().map(|a| a.uid), "uid")?;
        let gid = match self.groups()?.into_iter().find(|g| g.name == username) {
            Some(group) => group.gid,
            None => self.insert_group(username, Some(uid))?.gid,
        };

        let home = self.config.home_for(username);
        accounts.push(AccountRecord {
            username: username.to_string(),
            uid,
            gid,
            comment: String::new(),
            home: home.clone(),
            shell: self.config.default_shell.clone(),
        });
        self.save_accounts(&accounts)?;

        let credential = match secret {
            Some(secret) if !secret.is_empty() => CredentialState::Set(encode_secret(secret)),
            _ => CredentialState::Empty,
        };
        let today = self.clock.now().as_days();
        let mut shadows = self.shadow_table()?;
        shadows.remove(username);
        shadows.push(ShadowRecord::new(username, credential, today));
        self.save_shadows(&shadows)?;

        let now = self.clock.now();
        let home_root = self.config.home_root.clone();
        let mut gateway = self.gateway();
        gateway.make_dirs(&home_root, Mode::DIR_DEFAULT)?;
        if !gateway.exists(&home) {
            gateway.create(&home, Entry::directory(username, username, Mode::OWNER_ONLY, now))?;
        }

        info!(username, uid, gid, "account created");
        self.resolve_identity(username)
    }

    /// Adds an empty group
    pub fn create_group(&mut self, name: &str) -> AuthResult<Group> {
        validate_name(name)?;
        if self.groups()?.iter().any(|g| g.name == name) {
            return Err(AuthError::AlreadyExists(name.to_string()));
        }
        let group = self.insert_group(name, None)?;
        info!(group = name, gid = group.gid, "group created");
        Ok(group)
    }

    fn insert_group(&mut self, name: &str, preferred: Option<Gid>) -> AuthResult<Group> {
        let mut groups = self.group_table()?;
        let gid = match preferred {
            Some(gid) if !groups.records().any(|g| g.gid == gid) => gid,
            _ => next_id(groups.records().map(|g| g.gid), "gid")?,
        };
        let group = Group::new(name, gid);
        groups.push(group.clone());
        self.save_groups(&groups)?;
        Ok(group)
    }

    /// Lists `username` as a member of `group`; adding twice is a no-op
    pub fn add_group_member(&mut self, group: &str, username: &str) -> AuthResult<()> {
        if self.account_table()?.find(username).is_none() {
            return Err(AuthError::IdentityNotFound(username.to_string()));
        }
        let mut groups = self.group_table()?;
        let listed = groups
            .find(group)
            .ok_or_else(|| AuthError::GroupNotFound(group.to_string()))?
            .lists(username);
        if listed {
            return Ok(());
        }
        groups.update(group, |entry| entry.members.push(username.to_string()));
        self.save_groups(&groups)?;
        debug!(group, username, "group member added");
        Ok(())
    }
}

/// Smallest regular id above every id in use
fn next_id(used: impl Iterator<Item = u32>, kind: &'static str) -> AuthResult<u32> {
    match used.filter(|id| *id >= FIRST_REGULAR_ID).max() {
        None => Ok(FIRST_REGULAR_ID),
        Some(max) => max.checked_add(1).ok_or(AuthError::IdsExhausted(kind)),
    }
}

fn validate_name(name: &str) -> AuthResult<()> {
    let valid = PathResolver::is_valid_name(name)
        && name
            .chars()
            .next()
            .map_or(false, |c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{ManualClock, Timestamp};

    const PASSWD: &str = "root:x:0:0:root:/root:/bin/sh\nbob:x:1001:1001::/home/bob:/bin/sh\n";
    const GROUP: &str = "root:x:0:\nbob:x:1001:\ndevs:x:1500:bob\n";

    fn seeded(shadow: &str) -> (FileSystem, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_millis(20_000 * 86_400_000));
        let mut fs = FileSystem::new(clock.now());
        let root = Identity::root();
        let mut gw = Gateway::new(&mut fs, &root, &clock);
        gw.make_dir("/etc", Mode::DIR_DEFAULT).unwrap();
        gw.write_content("/etc/passwd", PASSWD, WriteMode::Truncate).unwrap();
        gw.write_content("/etc/group", GROUP, WriteMode::Truncate).unwrap();
        gw.write_content("/etc/shadow", shadow, WriteMode::Truncate).unwrap();
        (fs, clock)
    }

    #[test]
    fn test_resolve_identity_cross_references_groups() {
        let (mut fs, clock) = seeded("");
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);
        let bob = store.resolve_identity("bob").unwrap();
        assert_eq!(bob.uid, 1001);
        assert_eq!(bob.groups, vec!["bob", "devs"]);
        assert_eq!(store.identity_by_uid(0).unwrap().username, "root");
        assert_eq!(
            store.resolve_identity("mallory"),
            Err(AuthError::IdentityNotFound("mallory".to_string()))
        );
    }

    #[test]
    fn test_missing_record_files_mean_no_identity() {
        let clock = ManualClock::default();
        let mut fs = FileSystem::new(clock.now());
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);
        assert!(matches!(
            store.resolve_identity("root"),
            Err(AuthError::IdentityNotFound(_))
        ));
        assert!(!store.verify_credential("root", "anything"));
    }

    #[test]
    fn test_verify_credential_states() {
        let shadow = format!(
            "bob:{}:1::::::\nroot:::::::\n",
            encode_secret("hunter2")
        );
        let (mut fs, clock) = seeded(&shadow);
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);

        assert!(store.verify_credential("bob", "hunter2"));
        assert!(!store.verify_credential("bob", "hunter3"));
        // empty credential never verifies, not even against an empty secret
        assert!(!store.verify_credential("root", ""));

        store.lock_account("bob").unwrap();
        assert!(!store.verify_credential("bob", "hunter2"));
        assert!(store.credential_state("bob").unwrap().is_locked());
    }

    #[test]
    fn test_locked_marker_with_matching_digest_fails() {
        let shadow = format!("bob:!{}:1::::::\n", encode_secret("pw"));
        let (mut fs, clock) = seeded(&shadow);
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);
        assert!(!store.verify_credential("bob", "pw"));
    }

    #[test]
    fn test_set_credential_empty_is_no_password() {
        let (mut fs, clock) = seeded("bob:x:1::::::\n");
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);

        store.set_credential("bob", "").unwrap();
        assert_eq!(store.credential_state("bob").unwrap(), CredentialState::Empty);

        store.set_credential("bob", "s3cret").unwrap();
        assert!(store.verify_credential("bob", "s3cret"));

        let shadow = store.gateway().read_content("/etc/shadow").unwrap();
        assert!(shadow.starts_with(&format!("bob:{}:20000:", encode_secret("s3cret"))));
        assert!(shadow.ends_with('\n'));
    }

    #[test]
    fn test_set_credential_adds_missing_record() {
        let (mut fs, clock) = seeded("");
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);
        store.set_credential("bob", "pw").unwrap();
        assert!(store.verify_credential("bob", "pw"));
        assert_eq!(
            store.set_credential("ghost", "pw"),
            Err(AuthError::IdentityNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_create_account() {
        let (mut fs, clock) = seeded("");
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);

        let carol = store.create_account("carol", Some("pw")).unwrap();
        assert_eq!(carol.uid, 1002);
        assert_eq!(carol.gid, 1002);
        assert_eq!(carol.groups, vec!["carol"]);
        assert_eq!(carol.home, "/home/carol");
        assert!(store.verify_credential("carol", "pw"));

        let gateway = store.gateway();
        let home = gateway.filesystem().get("/home/carol").unwrap();
        assert_eq!(home.owner, "carol");
        assert_eq!(home.descriptor(), "drwx------");

        assert_eq!(
            store.create_account("carol", None),
            Err(AuthError::AlreadyExists("carol".to_string()))
        );
        assert_eq!(
            store.create_account("Bad Name", None),
            Err(AuthError::InvalidName("Bad Name".to_string()))
        );
    }

    #[test]
    fn test_rewrite_leaves_other_lines_untouched() {
        let root_line = format!("root:{}:19000:0:99999:7:::", encode_secret("toor"));
        let shadow = format!(
            "{}\nbob:{}:19000::::::\nnot a shadow line\n",
            root_line,
            encode_secret("old")
        );
        let (mut fs, clock) = seeded(&shadow);
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);

        store.set_credential("bob", "new").unwrap();
        let text = store.gateway().read_content("/etc/shadow").unwrap();
        assert_eq!(
            text,
            format!(
                "{}\nbob:{}:20000::::::\nnot a shadow line\n",
                root_line,
                encode_secret("new")
            )
        );
        assert!(store.verify_credential("root", "toor"));
        assert!(store.verify_credential("bob", "new"));
    }

    #[test]
    fn test_create_account_keeps_unparsed_records() {
        let (mut fs, clock) = seeded("");
        {
            let root = Identity::root();
            let mut gw = Gateway::new(&mut fs, &root, &clock);
            gw.write_content("/etc/passwd", "legacy entry\n", WriteMode::Append)
                .unwrap();
        }
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);
        store.create_account("carol", None).unwrap();
        store.add_group_member("devs", "carol").unwrap();

        let passwd = store.gateway().read_content("/etc/passwd").unwrap();
        assert!(passwd.starts_with(&format!("{}legacy entry\n", PASSWD)));
        let group = store.gateway().read_content("/etc/group").unwrap();
        assert!(group.starts_with("root:x:0:\nbob:x:1001:\ndevs:x:1500:bob,carol\n"));
    }

    #[test]
    fn test_exhausted_ids() {
        let (mut fs, clock) = seeded("");
        {
            let root = Identity::root();
            let mut gw = Gateway::new(&mut fs, &root, &clock);
            gw.write_content(
                "/etc/passwd",
                "max:x:4294967295:4294967295::/home/max:/bin/sh\n",
                WriteMode::Append,
            )
            .unwrap();
            gw.write_content("/etc/group", "max:x:4294967295:\n", WriteMode::Append)
                .unwrap();
        }
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);
        assert_eq!(
            store.create_account("carol", None),
            Err(AuthError::IdsExhausted("uid"))
        );
        assert_eq!(
            store.create_group("staff"),
            Err(AuthError::IdsExhausted("gid"))
        );
        assert!(store.resolve_identity("carol").is_err());
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id([0, 1, 999].into_iter(), "uid"), Ok(1000));
        assert_eq!(next_id([0, 1000, 1500].into_iter(), "uid"), Ok(1501));
        assert_eq!(
            next_id([u32::MAX].into_iter(), "gid"),
            Err(AuthError::IdsExhausted("gid"))
        );
    }

    #[test]
    fn test_group_administration() {
        let (mut fs, clock) = seeded("");
        let config = AuthConfig::default();
        let mut store = CredentialStore::new(&mut fs, &clock, &config);

        let sudo = store.create_group("sudo").unwrap();
        assert_eq!(sudo.gid, 1501);
        store.add_group_member("sudo", "bob").unwrap();
        store.add_group_member("sudo", "bob").unwrap();
        assert_eq!(store.groups_of("bob").unwrap(), vec!["bob", "devs", "sudo"]);

        assert_eq!(
            store.add_group_member("wheel", "bob"),
            Err(AuthError::GroupNotFound("wheel".to_string()))
        );
        assert_eq!(
            store.create_group("devs").unwrap_err(),
            AuthError::AlreadyExists("devs".to_string())
        );
    }
}
