//! `sudo`: run one operation as root without changing the acting identity

use crate::context::ExecutionContext;
use crate::error::{SessionError, SessionResult};
use crate::machine::Machine;
use identity::Identity;
use services_auth::CredentialState;
use services_fs::Gateway;
use tracing::{debug, info};

/// Result of starting `sudo`
#[derive(Debug)]
#[must_use]
pub enum SudoStep {
    /// Authorized without a prompt (root, cache hit, or no password)
    Ready(SudoGrant),
    /// The invoking user's own secret is required
    NeedSecret(SudoPrompt),
}

/// A pending `sudo` waiting on the invoking user's secret
#[derive(Debug)]
#[must_use]
pub struct SudoPrompt {
    invoker: Identity,
}

impl SudoPrompt {
    pub fn prompt(&self) -> String {
        format!("[sudo] password for {}: ", self.invoker.username)
    }

    /// Answers the prompt; success refreshes the privilege cache
    pub fn submit(self, machine: &mut Machine, secret: &str) -> SessionResult<SudoGrant> {
        let mut store = machine.credentials();
        if !store.verify_credential(&self.invoker.username, secret) {
            return Err(SessionError::AuthenticationFailed(self.invoker.username));
        }
        store.refresh_cache(self.invoker.uid)?;
        grant(machine, self.invoker)
    }

    /// Abandons the prompt, which counts as a failed authentication
    pub fn cancel(self) -> SessionError {
        info!(user = %self.invoker, "sudo cancelled");
        SessionError::AuthenticationFailed(self.invoker.username)
    }
}

/// Permission to act as root on behalf of the invoking user
#[derive(Debug, Clone)]
pub struct SudoGrant {
    invoker: Identity,
    root: Identity,
}

impl SudoGrant {
    pub fn invoker(&self) -> &Identity {
        &self.invoker
    }

    /// Runs `operation` with root as the acting identity
    ///
    /// The session's own identity is never touched, so it is back in effect
    /// as soon as `operation` returns.
    pub fn run<T>(
        &self,
        machine: &mut Machine,
        operation: impl FnOnce(&mut Gateway<'_>) -> T,
    ) -> T {
        debug!(invoker = %self.invoker, "running as root");
        let mut gateway = machine.gateway(&self.root);
        operation(&mut gateway)
    }
}

fn grant(machine: &mut Machine, invoker: Identity) -> SessionResult<SudoGrant> {
    let root = machine
        .credentials()
        .identity_by_uid(core_types::ROOT_UID)
        .unwrap_or_else(|_| Identity::root());
    info!(invoker = %invoker, "sudo granted");
    Ok(SudoGrant { invoker, root })
}

impl ExecutionContext {
    /// Starts `sudo` for the acting identity
    ///
    /// Only root and members of the configured sudo group may proceed. A
    /// valid privilege cache entry or an account without a password skips
    /// the prompt.
    pub fn sudo(&self, machine: &mut Machine) -> SessionResult<SudoStep> {
        let invoker = self.user().clone();
        if invoker.is_root() {
            return grant(machine, invoker).map(SudoStep::Ready);
        }

        let sudo_group = machine.config().sudo_group.clone();
        if !invoker.in_group(&sudo_group) {
            info!(user = %invoker, "not in sudoers group");
            return Err(SessionError::NotPermitted {
                user: invoker.username,
                action: "use sudo".to_string(),
            });
        }

        let mut store = machine.credentials();
        if store.is_cache_valid(invoker.uid) {
            return grant(machine, invoker).map(SudoStep::Ready);
        }
        if matches!(store.credential_state(&invoker.username), Ok(CredentialState::Empty)) {
            store.refresh_cache(invoker.uid)?;
            return grant(machine, invoker).map(SudoStep::Ready);
        }

        Ok(SudoStep::NeedSecret(SudoPrompt { invoker }))
    }
}
