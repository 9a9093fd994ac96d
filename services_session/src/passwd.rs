//! `passwd`: change a credential through an explicit prompt state machine
//!
//! ```text
//! AwaitCurrent ──submit ok──▶ AwaitNew ──submit──▶ AwaitConfirm ──match──▶ Done
//!      │                         │                      │
//!      └──────── cancel / wrong secret / mismatch ──────┴──────────▶ Cancelled
//! ```
//!
//! Root, and accounts that have no password yet, start at `AwaitNew`.
//! Cancelling is a silent abort: no error and no change. A wrong current
//! secret or a confirmation mismatch also ends in `Cancelled`, but the
//! submit that caused it returns the error.

use crate::context::ExecutionContext;
use crate::error::{SessionError, SessionResult};
use crate::machine::Machine;
use services_auth::CredentialState;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswdState {
    AwaitCurrent,
    AwaitNew,
    AwaitConfirm,
    Done,
    Cancelled,
}

impl PasswdState {
    /// Text shown while waiting in this state
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            PasswdState::AwaitCurrent => Some("Current password: "),
            PasswdState::AwaitNew => Some("New password: "),
            PasswdState::AwaitConfirm => Some("Retype new password: "),
            PasswdState::Done | PasswdState::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PasswdState::Done | PasswdState::Cancelled)
    }
}

/// Operator input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswdEvent<'a> {
    Submit(&'a str),
    Cancel,
}

/// What the caller should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswdStep {
    /// Collect another secret for the given state
    NeedInput(PasswdState),
    /// The credential was changed
    Done,
    /// Nothing was changed
    Cancelled,
}

/// One `passwd` invocation
#[derive(Debug)]
pub struct PasswdFlow {
    target: String,
    state: PasswdState,
    new_secret: Option<String>,
}

impl PasswdFlow {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> PasswdState {
        self.state
    }

    fn step(&self) -> PasswdStep {
        match self.state {
            PasswdState::Done => PasswdStep::Done,
            PasswdState::Cancelled => PasswdStep::Cancelled,
            waiting => PasswdStep::NeedInput(waiting),
        }
    }

    /// Advances the machine with one event
    ///
    /// Events after a terminal state are ignored.
    pub fn advance(&mut self, machine: &mut Machine, event: PasswdEvent<'_>) -> SessionResult<PasswdStep> {
        if self.state.is_terminal() {
            return Ok(self.step());
        }

        let secret = match event {
            PasswdEvent::Cancel => {
                self.abort();
                info!(user = %self.target, "passwd cancelled");
                return Ok(self.step());
            }
            PasswdEvent::Submit(secret) => secret,
        };

        match self.state {
            PasswdState::AwaitCurrent => {
                if !machine.credentials().verify_credential(&self.target, secret) {
                    self.abort();
                    return Err(SessionError::AuthenticationFailed(self.target.clone()));
                }
                self.state = PasswdState::AwaitNew;
            }
            PasswdState::AwaitNew => {
                self.new_secret = Some(secret.to_string());
                self.state = PasswdState::AwaitConfirm;
            }
            PasswdState::AwaitConfirm => {
                if self.new_secret.as_deref() != Some(secret) {
                    self.abort();
                    return Err(SessionError::SecretMismatch);
                }
                machine.credentials().set_credential(&self.target, secret)?;
                self.new_secret = None;
                self.state = PasswdState::Done;
            }
            PasswdState::Done | PasswdState::Cancelled => {}
        }
        Ok(self.step())
    }

    fn abort(&mut self) {
        self.new_secret = None;
        self.state = PasswdState::Cancelled;
    }
}

impl ExecutionContext {
    /// Starts changing the credential of `username` (default: the acting identity)
    ///
    /// Only root may change another account's credential.
    pub fn passwd(&self, machine: &mut Machine, username: Option<&str>) -> SessionResult<PasswdFlow> {
        let target = username.unwrap_or(&self.user().username).to_string();
        if target != self.user().username && !self.user().is_root() {
            return Err(SessionError::NotPermitted {
                user: self.user().username.clone(),
                action: format!("change the password of {}", target),
            });
        }

        let mut store = machine.credentials();
        store.resolve_identity(&target)?;
        let has_secret = !matches!(store.credential_state(&target), Ok(CredentialState::Empty));

        let state = if self.user().is_root() || !has_secret {
            PasswdState::AwaitNew
        } else {
            PasswdState::AwaitCurrent
        };
        Ok(PasswdFlow {
            target,
            state,
            new_secret: None,
        })
    }
}
