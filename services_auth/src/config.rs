//! Credential store configuration

use crate::error::{AuthError, AuthResult};
use core_types::Uid;
use fs_path::PathResolver;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the record files live and how the privilege cache behaves
///
/// Every field has a default, so a partial JSON document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Account records
    pub passwd_path: String,
    /// Credential records
    pub shadow_path: String,
    /// Group records
    pub group_path: String,
    /// Directory holding one cache record per UID
    pub cache_dir: String,
    /// How long a successful elevation suppresses the next prompt
    pub cache_window_secs: u64,
    /// Members of this group may use `sudo`
    pub sudo_group: String,
    /// Shell given to new accounts
    pub default_shell: String,
    /// Parent of new home directories
    pub home_root: String,
}

impl AuthConfig {
    pub fn new() -> Self {
        Self {
            passwd_path: "/etc/passwd".to_string(),
            shadow_path: "/etc/shadow".to_string(),
            group_path: "/etc/group".to_string(),
            cache_dir: "/var/run/sudo/ts".to_string(),
            cache_window_secs: 15 * 60,
            sudo_group: "sudo".to_string(),
            default_shell: "/bin/sh".to_string(),
            home_root: "/home".to_string(),
        }
    }

    /// Parses a JSON config; absent fields keep their defaults
    ///
    /// Path fields must be absolute and are stored in canonical form.
    pub fn from_json(bytes: &[u8]) -> AuthResult<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|e| AuthError::Config(e.to_string()))?;
        config.canonical()
    }

    /// Checks every path field and normalizes it
    pub fn canonical(mut self) -> AuthResult<Self> {
        for (field, value) in [
            ("passwd_path", &mut self.passwd_path),
            ("shadow_path", &mut self.shadow_path),
            ("group_path", &mut self.group_path),
            ("cache_dir", &mut self.cache_dir),
            ("home_root", &mut self.home_root),
        ] {
            if !value.starts_with('/') {
                return Err(AuthError::Config(format!(
                    "{} must be an absolute path, got {:?}",
                    field, value
                )));
            }
            *value = PathResolver::normalize(value);
        }
        for (field, value) in [
            ("passwd_path", &self.passwd_path),
            ("shadow_path", &self.shadow_path),
            ("group_path", &self.group_path),
        ] {
            if value == fs_path::ROOT {
                return Err(AuthError::Config(format!("{} names the root directory", field)));
            }
        }
        Ok(self)
    }

    pub fn cache_window(&self) -> Duration {
        Duration::from_secs(self.cache_window_secs)
    }

    /// Path of the cache record for `uid`
    pub fn cache_path(&self, uid: Uid) -> String {
        PathResolver::join(&self.cache_dir, &uid.to_string())
    }

    /// Home directory assigned to a new account
    pub fn home_for(&self, username: &str) -> String {
        PathResolver::join(&self.home_root, username)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}
