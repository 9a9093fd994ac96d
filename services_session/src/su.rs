//! `su`: switch the acting identity, pushing a session frame

use crate::context::ExecutionContext;
use crate::error::{SessionError, SessionResult};
use crate::machine::Machine;
use identity::Identity;
use services_auth::CredentialState;
use tracing::{debug, info};

/// Result of starting `su`
#[derive(Debug)]
#[must_use]
pub enum SuOutcome {
    /// The switch happened without a prompt
    Switched,
    /// The target is already the acting identity; nothing was pushed
    AlreadyActive,
    /// The target's secret is required to continue
    NeedSecret(SuPrompt),
}

/// A pending `su` waiting on the target's secret
#[derive(Debug)]
#[must_use]
pub struct SuPrompt {
    target: Identity,
}

impl SuPrompt {
    /// The identity being switched to
    pub fn target(&self) -> &Identity {
        &self.target
    }

    pub fn prompt(&self) -> &'static str {
        "Password: "
    }

    /// Answers the prompt; on success the context switches to the target
    pub fn submit(
        self,
        ctx: &mut ExecutionContext,
        machine: &mut Machine,
        secret: &str,
    ) -> SessionResult<()> {
        if !machine
            .credentials()
            .verify_credential(&self.target.username, secret)
        {
            return Err(SessionError::AuthenticationFailed(self.target.username));
        }
        ctx.switch_to(self.target);
        Ok(())
    }

    /// Abandons the prompt, which counts as a failed authentication
    pub fn cancel(self) -> SessionError {
        info!(to = %self.target, "su cancelled");
        SessionError::AuthenticationFailed(self.target.username)
    }
}

impl ExecutionContext {
    /// Starts switching to `username`
    ///
    /// Root and accounts without a password switch immediately. Switching
    /// to the acting identity is a no-op. A locked target can never be
    /// reached except by root.
    pub fn su(&mut self, machine: &mut Machine, username: &str) -> SessionResult<SuOutcome> {
        let mut store = machine.credentials();
        let target = store.resolve_identity(username)?;

        if target.same_account(self.user()) {
            debug!(user = %target, "su to the acting identity");
            return Ok(SuOutcome::AlreadyActive);
        }

        let passwordless = matches!(store.credential_state(username), Ok(CredentialState::Empty));
        if self.user().is_root() || passwordless {
            self.switch_to(target);
            return Ok(SuOutcome::Switched);
        }

        Ok(SuOutcome::NeedSecret(SuPrompt { target }))
    }
}
