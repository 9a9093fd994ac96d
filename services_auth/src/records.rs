//! Line-oriented record codecs
//!
//! All three record files share one shape: one record per line, fields
//! joined by `:`, every line (including the last) terminated by `\n`.

use core_types::{Gid, Uid};
use identity::Group;

/// Field delimiter shared by every record kind
pub const DELIMITER: char = ':';

/// A record that occupies exactly one line of a record file
pub trait Record: Sized {
    /// Decodes one line; `None` for malformed input
    fn parse(line: &str) -> Option<Self>;

    /// Encodes the record as one line, without the terminator
    fn render(&self) -> String;

    /// The key the record is looked up by
    fn key(&self) -> &str;
}

/// One line of a record file, with its decoded record when it parses
#[derive(Debug, Clone)]
struct Line<R> {
    raw: String,
    record: Option<R>,
}

/// A whole record file
///
/// Lines that do not decode are carried verbatim, and records nobody touched
/// render back exactly as they were read. Only lines that are updated, added
/// or removed change on a rewrite.
#[derive(Debug, Clone)]
pub struct Table<R> {
    lines: Vec<Line<R>>,
}

impl<R: Record> Table<R> {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Decodes a record file; malformed lines are kept and logged
    pub fn parse(text: &str) -> Self {
        let lines = text
            .lines()
            .map(|line| {
                let record = if line.trim().is_empty() {
                    None
                } else {
                    let record = R::parse(line);
                    if record.is_none() {
                        tracing::warn!(line, "keeping malformed record verbatim");
                    }
                    record
                };
                Line {
                    raw: line.to_string(),
                    record,
                }
            })
            .collect();
        Self { lines }
    }

    /// Every decoded record, in file order
    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.lines.iter().filter_map(|line| line.record.as_ref())
    }

    pub fn into_records(self) -> Vec<R> {
        self.lines.into_iter().filter_map(|line| line.record).collect()
    }

    /// First record stored under `key`
    pub fn find(&self, key: &str) -> Option<&R> {
        self.records().find(|record| record.key() == key)
    }

    /// Applies `change` to the first record under `key` and re-encodes its line
    ///
    /// Returns false when no such record exists.
    pub fn update(&mut self, key: &str, change: impl FnOnce(&mut R)) -> bool {
        for line in &mut self.lines {
            if let Some(record) = line.record.as_mut().filter(|r| r.key() == key) {
                change(record);
                line.raw = record.render();
                return true;
            }
        }
        false
    }

    /// Appends a record as a new last line
    pub fn push(&mut self, record: R) {
        self.lines.push(Line {
            raw: record.render(),
            record: Some(record),
        });
    }

    /// Drops every record under `key`; malformed lines are never dropped
    pub fn remove(&mut self, key: &str) {
        self.lines
            .retain(|line| line.record.as_ref().map_or(true, |r| r.key() != key));
    }

    /// Encodes the file, every line terminated by a newline
    pub fn render(&self) -> String {
        self.lines.iter().map(|line| format!("{}\n", line.raw)).collect()
    }
}

impl<R: Record> Default for Table<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_optional(field: &str) -> Option<Option<u64>> {
    if field.is_empty() {
        Some(None)
    } else {
        field.parse().ok().map(Some)
    }
}

fn render_optional(value: Option<u64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ----------------------------------------------------------------------
// Accounts
// ----------------------------------------------------------------------

/// `username:x:uid:gid:comment:home:shell`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub username: String,
    pub uid: Uid,
    pub gid: Gid,
    pub comment: String,
    pub home: String,
    pub shell: String,
}

impl Record for AccountRecord {
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        if fields.len() != 7 || fields[0].is_empty() {
            return None;
        }
        Some(Self {
            username: fields[0].to_string(),
            uid: fields[2].parse().ok()?,
            gid: fields[3].parse().ok()?,
            comment: fields[4].to_string(),
            home: fields[5].to_string(),
            shell: fields[6].to_string(),
        })
    }

    fn render(&self) -> String {
        format!(
            "{}:x:{}:{}:{}:{}:{}",
            self.username, self.uid, self.gid, self.comment, self.home, self.shell
        )
    }

    fn key(&self) -> &str {
        &self.username
    }
}

// ----------------------------------------------------------------------
// Credentials
// ----------------------------------------------------------------------

/// Decoded credential field of a shadow record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    /// No password: secret verification always fails, but flows that do not
    /// need a secret are open
    Empty,
    /// Locked (`!`-prefixed or `*`); keeps the raw field so unlocking can restore it
    Locked(String),
    /// Encoded secret
    Set(String),
}

impl CredentialState {
    pub fn decode(field: &str) -> Self {
        if field.is_empty() {
            CredentialState::Empty
        } else if field.starts_with('!') || field == "*" {
            CredentialState::Locked(field.to_string())
        } else {
            CredentialState::Set(field.to_string())
        }
    }

    pub fn encode(&self) -> &str {
        match self {
            CredentialState::Empty => "",
            CredentialState::Locked(raw) | CredentialState::Set(raw) => raw,
        }
    }

    /// Returns the locked form of this state
    pub fn locked(&self) -> Self {
        match self {
            CredentialState::Empty => CredentialState::Locked("!".to_string()),
            CredentialState::Locked(_) => self.clone(),
            CredentialState::Set(value) => CredentialState::Locked(format!("!{}", value)),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CredentialState::Empty)
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, CredentialState::Locked(_))
    }
}

/// `username:credential:lastChange:min:max:warn:inactive:expire`
///
/// Trailing numeric fields may be empty. An empty ninth (reserved) field is
/// accepted on input and dropped when the record is re-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowRecord {
    pub username: String,
    pub credential: CredentialState,
    /// Days since epoch of the last credential change
    pub last_change: Option<u64>,
    pub min_days: Option<u64>,
    pub max_days: Option<u64>,
    pub warn_days: Option<u64>,
    pub inactive_days: Option<u64>,
    pub expire_days: Option<u64>,
}

impl ShadowRecord {
    /// A fresh record with the usual aging defaults
    pub fn new(username: impl Into<String>, credential: CredentialState, today: u64) -> Self {
        Self {
            username: username.into(),
            credential,
            last_change: Some(today),
            min_days: Some(0),
            max_days: Some(99_999),
            warn_days: Some(7),
            inactive_days: None,
            expire_days: None,
        }
    }
}

impl Record for ShadowRecord {
    fn parse(line: &str) -> Option<Self> {
        let mut fields: Vec<&str> = line.split(DELIMITER).collect();
        if fields.len() == 9 && fields[8].is_empty() {
            fields.pop();
        }
        if fields.len() < 2 || fields.len() > 8 || fields[0].is_empty() {
            return None;
        }
        let numeric = |index: usize| parse_optional(fields.get(index).copied().unwrap_or(""));
        Some(Self {
            username: fields[0].to_string(),
            credential: CredentialState::decode(fields[1]),
            last_change: numeric(2)?,
            min_days: numeric(3)?,
            max_days: numeric(4)?,
            warn_days: numeric(5)?,
            inactive_days: numeric(6)?,
            expire_days: numeric(7)?,
        })
    }

    fn render(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}:{}",
            self.username,
            self.credential.encode(),
            render_optional(self.last_change),
            render_optional(self.min_days),
            render_optional(self.max_days),
            render_optional(self.warn_days),
            render_optional(self.inactive_days),
            render_optional(self.expire_days),
        )
    }

    fn key(&self) -> &str {
        &self.username
    }
}

// ----------------------------------------------------------------------
// Groups
// ----------------------------------------------------------------------

/// `groupname:x:gid:member1,member2`
impl Record for Group {
    fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(DELIMITER).collect();
        if fields.len() != 4 || fields[0].is_empty() {
            return None;
        }
        let members = fields[3]
            .split(',')
            .filter(|member| !member.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        Some(Group::new(fields[0], fields[2].parse().ok()?).with_members(members))
    }

    fn render(&self) -> String {
        format!("{}:x:{}:{}", self.name, self.gid, self.members.join(","))
    }

    fn key(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_line() {
        let line = "bob:x:1001:1001:Bob Builder:/home/bob:/bin/sh";
        let record = AccountRecord::parse(line).unwrap();
        assert_eq!(record.uid, 1001);
        assert_eq!(record.home, "/home/bob");
        assert_eq!(record.render(), line);
    }

    #[test]
    fn test_account_malformed() {
        assert!(AccountRecord::parse("bob:x:1001:1001:/home/bob:/bin/sh").is_none());
        assert!(AccountRecord::parse("bob:x:abc:1001::/home/bob:/bin/sh").is_none());
    }

    #[test]
    fn test_credential_states() {
        assert_eq!(CredentialState::decode(""), CredentialState::Empty);
        assert!(CredentialState::decode("!abc").is_locked());
        assert!(CredentialState::decode("*").is_locked());
        assert_eq!(
            CredentialState::decode("abc"),
            CredentialState::Set("abc".to_string())
        );
    }

    #[test]
    fn test_locking_keeps_value() {
        let set = CredentialState::Set("abc".to_string());
        assert_eq!(set.locked(), CredentialState::Locked("!abc".to_string()));
        assert_eq!(set.locked().locked(), set.locked());
        assert_eq!(CredentialState::Empty.locked().encode(), "!");
    }

    #[test]
    fn test_shadow_trailing_fields_may_be_empty() {
        let record = ShadowRecord::parse("alice:abc:19000::::::").unwrap();
        assert_eq!(record.last_change, Some(19000));
        assert_eq!(record.max_days, None);
        assert_eq!(record.render(), "alice:abc:19000::::::");

        let short = ShadowRecord::parse("carol:").unwrap();
        assert!(short.credential.is_empty());
        assert_eq!(short.render(), "carol:::::::");
    }

    #[test]
    fn test_shadow_bad_number() {
        assert!(ShadowRecord::parse("alice:abc:soon:0:99999:7:::").is_none());
    }

    #[test]
    fn test_group_line() {
        let group = Group::parse("devs:x:1500:bob,dave").unwrap();
        assert_eq!(group.gid, 1500);
        assert_eq!(group.members, vec!["bob", "dave"]);
        assert_eq!(group.render(), "devs:x:1500:bob,dave");

        let empty = Group::parse("staff:x:50:").unwrap();
        assert!(empty.members.is_empty());
        assert_eq!(empty.render(), "staff:x:50:");
    }

    #[test]
    fn test_shadow_reserved_field() {
        let record = ShadowRecord::parse("root:abc:19000:0:99999:7:::").unwrap();
        assert_eq!(record.warn_days, Some(7));
        assert!(ShadowRecord::parse("root:abc:19000:0:99999:7:::x").is_none());
    }

    #[test]
    fn test_table_keeps_malformed_lines() {
        let text = "root:x:0:\n\ngarbage\nsudo:x:27:bob\n";
        let table: Table<Group> = Table::parse(text);
        assert_eq!(table.records().count(), 2);
        assert_eq!(table.render(), text);
    }

    #[test]
    fn test_table_update_touches_one_line() {
        let text = "root:x:0:\nstaff:x:50:alice,,\nodd line\nsudo:x:27:bob\n";
        let mut table: Table<Group> = Table::parse(text);
        assert!(table.update("sudo", |g| g.members.push("carol".to_string())));
        assert!(!table.update("wheel", |_| {}));
        assert_eq!(
            table.render(),
            "root:x:0:\nstaff:x:50:alice,,\nodd line\nsudo:x:27:bob,carol\n"
        );

        table.remove("staff");
        table.push(Group::new("devs", 1500));
        assert_eq!(
            table.render(),
            "root:x:0:\nodd line\nsudo:x:27:bob,carol\ndevs:x:1500:\n"
        );
        assert_eq!(table.find("devs").map(|g| g.gid), Some(1500));
    }
}
