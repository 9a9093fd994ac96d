//! Execution context: the acting identity and where it stands

use crate::error::{SessionError, SessionResult};
use crate::machine::Machine;
use core_types::SessionId;
use fs_path::{PathContext, PathResolver, ROOT};
use identity::{Identity, SessionStack, Unwind};
use policy::Access;
use services_auth::CredentialState;
use services_fs::FsError;
use tracing::{debug, info};

/// What `exit` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// An elevation ended; the named identity is acting again
    Returned(String),
    /// There was nothing to unwind: the outermost session ends
    Logout,
}

/// Per-session state handed to every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    session_id: SessionId,
    user: Identity,
    login_user: Identity,
    cwd: String,
    previous_dir: String,
    stack: SessionStack,
}

impl ExecutionContext {
    /// Starts a session for `identity` in its home directory (or `/`)
    pub fn new(machine: &mut Machine, identity: Identity) -> Self {
        let home_reachable = machine
            .gateway(&identity)
            .fetch(&identity.home, Access::Traverse)
            .map(|entry| entry.is_dir())
            .unwrap_or(false);
        let cwd = if home_reachable {
            identity.home.clone()
        } else {
            ROOT.to_string()
        };
        let ctx = Self {
            session_id: SessionId::new(),
            login_user: identity.clone(),
            user: identity,
            previous_dir: cwd.clone(),
            cwd,
            stack: SessionStack::new(),
        };
        info!(session = %ctx.session_id, user = %ctx.user, "session started");
        ctx
    }

    /// Authenticates `username` and starts a session
    ///
    /// An account without a password logs in whatever is presented; a locked
    /// account never does.
    pub fn login(machine: &mut Machine, username: &str, secret: &str) -> SessionResult<Self> {
        let mut store = machine.credentials();
        let identity = store.resolve_identity(username)?;
        let accepted = match store.credential_state(username) {
            Ok(CredentialState::Empty) => true,
            Ok(_) => store.verify_credential(username, secret),
            Err(_) => false,
        };
        if !accepted {
            return Err(SessionError::AuthenticationFailed(username.to_string()));
        }
        Ok(Self::new(machine, identity))
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The identity every check is made against
    pub fn user(&self) -> &Identity {
        &self.user
    }

    /// The identity that started the session
    pub fn login_user(&self) -> &Identity {
        &self.login_user
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn previous_dir(&self) -> &str {
        &self.previous_dir
    }

    /// Number of active `su` elevations
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    pub fn stack(&self) -> &SessionStack {
        &self.stack
    }

    /// Resolves a user-supplied path against this context
    pub fn resolve(&self, raw: &str) -> String {
        PathResolver::resolve(
            raw,
            &PathContext {
                cwd: &self.cwd,
                previous: &self.previous_dir,
                home: &self.user.home,
            },
        )
    }

    /// Changes the working directory; requires traverse on the target
    pub fn cd(&mut self, machine: &mut Machine, raw: &str) -> SessionResult<String> {
        let target = self.resolve(raw);
        let gateway = machine.gateway(&self.user);
        let is_file = gateway.exists(&target)
            && gateway
                .filesystem()
                .get(&target)
                .map_or(false, |entry| entry.is_file());
        if is_file {
            return Err(FsError::NotADirectory(target).into());
        }
        gateway.fetch(&target, Access::Traverse)?;
        self.previous_dir = std::mem::replace(&mut self.cwd, target);
        debug!(session = %self.session_id, cwd = %self.cwd, "changed directory");
        Ok(self.cwd.clone())
    }

    /// Pushes the current identity and switches to `target`
    pub(crate) fn switch_to(&mut self, target: Identity) {
        self.stack.elevate(&target, &self.user, &self.cwd);
        info!(session = %self.session_id, from = %self.user, to = %target, "identity switched");
        self.user = target;
    }

    /// Ends the innermost elevation, or reports that the session itself ends
    pub fn exit(&mut self) -> ExitOutcome {
        match self.stack.unwind() {
            Unwind::Restore(frame) => {
                info!(session = %self.session_id, from = %self.user, to = %frame.identity, "elevation ended");
                self.user = frame.identity;
                self.cwd = frame.working_dir;
                ExitOutcome::Returned(self.user.username.clone())
            }
            Unwind::Outermost => {
                info!(session = %self.session_id, user = %self.user, "logout");
                ExitOutcome::Logout
            }
        }
    }

    /// Unwinds every elevation back to the login identity
    ///
    /// Returns how many frames were unwound.
    pub fn logout(&mut self) -> usize {
        let unwound = self.stack.depth();
        for _ in 0..unwound {
            self.exit();
        }
        unwound
    }
}
