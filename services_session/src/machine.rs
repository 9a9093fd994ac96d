//! The simulated machine: filesystem, clock and auth configuration

use crate::error::SessionResult;
use core_types::Clock;
use fs_entry::{Entry, Mode};
use fs_path::PathResolver;
use identity::Identity;
use services_auth::{AuthConfig, CredentialStore};
use services_fs::{FileSystem, Gateway};
use tracing::info;

/// Everything a session operates on, apart from the session itself
pub struct Machine {
    fs: FileSystem,
    config: AuthConfig,
    clock: Box<dyn Clock>,
}

impl Machine {
    pub fn new(fs: FileSystem, config: AuthConfig, clock: impl Clock + 'static) -> Self {
        Self {
            fs,
            config,
            clock: Box::new(clock),
        }
    }

    /// Builds a fresh machine with the minimal system layout
    ///
    /// Creates `/etc` with the three record files (root only), `/home`,
    /// `/root`, a sticky world-writable `/tmp`, and the privilege cache
    /// directory. `root_secret` becomes root's password; empty means none.
    pub fn bootstrap(
        config: AuthConfig,
        clock: impl Clock + 'static,
        root_secret: &str,
    ) -> SessionResult<Self> {
        let fs = FileSystem::new(clock.now());
        let mut machine = Self::new(fs, config, clock);
        let root = Identity::root();
        let config = machine.config.clone();
        let now = machine.clock.now();

        {
            let mut gw = machine.gateway(&root);
            gw.make_dir("/etc", Mode::DIR_DEFAULT)?;
            gw.make_dirs(&config.home_root, Mode::DIR_DEFAULT)?;
            gw.make_dir(&root.home, Mode::OWNER_ONLY)?;
            gw.make_dir("/tmp", Mode::SHARED_TMP)?;
            if let Some(parent) = PathResolver::parent(&config.cache_dir) {
                gw.make_dirs(parent, Mode::DIR_DEFAULT)?;
            }
            gw.make_dirs(&config.cache_dir, Mode::OWNER_ONLY)?;

            let records = [
                (
                    &config.passwd_path,
                    format!("root:x:0:0:root:{}:{}\n", root.home, root.shell),
                    Mode::FILE_DEFAULT,
                ),
                (
                    &config.group_path,
                    format!("root:x:0:\n{}:x:27:\n", config.sudo_group),
                    Mode::FILE_DEFAULT,
                ),
                (&config.shadow_path, String::from("root:::0:99999:7:::\n"), Mode::PRIVATE_FILE),
            ];
            for (path, text, mode) in records {
                if let Some(parent) = PathResolver::parent(path) {
                    gw.make_dirs(parent, Mode::DIR_DEFAULT)?;
                }
                gw.create(path, Entry::file(text, "root", "root", mode, now))?;
            }
        }

        machine.credentials().set_credential("root", root_secret)?;
        info!(entries = machine.fs.len(), "machine bootstrapped");
        Ok(machine)
    }

    pub fn filesystem(&self) -> &FileSystem {
        &self.fs
    }

    /// Gives up the machine, keeping its filesystem (e.g. to save a snapshot)
    pub fn into_filesystem(self) -> FileSystem {
        self.fs
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Filesystem access as `actor`
    pub fn gateway<'a>(&'a mut self, actor: &'a Identity) -> Gateway<'a> {
        Gateway::new(&mut self.fs, actor, self.clock.as_ref())
    }

    /// The credential store, acting as the system
    pub fn credentials(&mut self) -> CredentialStore<'_> {
        CredentialStore::new(&mut self.fs, self.clock.as_ref(), &self.config)
    }
}
