//! Elevated-privilege cache
//!
//! One record per UID under the configured cache directory; the content is
//! the decimal millisecond timestamp of the last successful authentication.
//! Expiry is evaluated on each check, and a stale or unreadable record is
//! deleted as soon as it is observed.

use crate::error::AuthResult;
use crate::store::CredentialStore;
use core_types::{Timestamp, Uid};
use fs_entry::{Entry, Mode};
use services_fs::{FsError, WriteMode};
use tracing::{debug, info, warn};

impl CredentialStore<'_> {
    /// Returns whether `uid` authenticated within the cache window
    pub fn is_cache_valid(&mut self, uid: Uid) -> bool {
        let path = self.config().cache_path(uid);
        let now = self.clock().now();
        let window = self.config().cache_window();

        let content = match self.gateway().read_content(&path) {
            Ok(content) => content,
            Err(FsError::NotFound(_)) => return false,
            Err(err) => {
                warn!(uid, error = %err, "unreadable privilege cache record");
                return false;
            }
        };

        let stamp = content.trim().parse::<u64>().ok().map(Timestamp::from_millis);
        match stamp {
            Some(stamp) if now.duration_since(stamp) < window => {
                debug!(uid, %stamp, "privilege cache hit");
                true
            }
            _ => {
                if let Err(err) = self.gateway().remove(&path) {
                    warn!(uid, error = %err, "failed to evict privilege cache record");
                }
                info!(uid, "privilege cache expired");
                false
            }
        }
    }

    /// Records a successful authentication for `uid` at the current time
    pub fn refresh_cache(&mut self, uid: Uid) -> AuthResult<()> {
        let dir = self.config().cache_dir.clone();
        let path = self.config().cache_path(uid);
        let now = self.clock().now();
        let stamp = now.as_millis().to_string();

        let mut gateway = self.gateway();
        gateway.make_dirs(&dir, Mode::OWNER_ONLY)?;
        if gateway.exists(&path) {
            gateway.write_content(&path, &stamp, WriteMode::Truncate)?;
        } else {
            gateway.create(&path, Entry::file(stamp, "root", "root", Mode::PRIVATE_FILE, now))?;
        }
        debug!(uid, %now, "privilege cache refreshed");
        Ok(())
    }

    /// Drops the cache record for `uid`, if any
    pub fn clear_cache(&mut self, uid: Uid) -> AuthResult<()> {
        let path = self.config().cache_path(uid);
        let mut gateway = self.gateway();
        if gateway.exists(&path) {
            gateway.remove(&path)?;
        }
        Ok(())
    }
}
