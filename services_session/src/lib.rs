//! # Session Service
//!
//! Who is acting, where they are, and how that changes: login, `su`, `sudo`,
//! `exit`, `logout`, `cd` and `passwd` over the simulated filesystem.
//!
//! ## Philosophy
//!
//! - **No ambient state**: the acting identity and working directory live in
//!   an [`ExecutionContext`] value passed to every command
//! - **Prompts are state machines**: a flow that needs a secret returns a
//!   pending value; the caller answers it with `submit` or `cancel` instead of
//!   the flow blocking or calling back
//! - **Two distinct shortcuts**: the `su` stack and the `sudo` cache both
//!   avoid repeated prompts, and neither consults the other
//!
//! ## Example
//!
//! ```
//! use core_types::{ManualClock, Timestamp};
//! use services_auth::AuthConfig;
//! use services_session::{ExecutionContext, Machine};
//!
//! let clock = ManualClock::new(Timestamp::from_millis(0));
//! let mut machine = Machine::bootstrap(AuthConfig::default(), clock, "toor").unwrap();
//! machine.credentials().create_account("alice", Some("pw")).unwrap();
//!
//! let mut ctx = ExecutionContext::login(&mut machine, "alice", "pw").unwrap();
//! assert_eq!(ctx.cwd(), "/home/alice");
//! ctx.cd(&mut machine, "/tmp").unwrap();
//! assert_eq!(ctx.cwd(), "/tmp");
//! ```

pub mod context;
pub mod error;
pub mod machine;
pub mod passwd;
pub mod su;
pub mod sudo;

pub use context::{ExecutionContext, ExitOutcome};
pub use error::{SessionError, SessionResult};
pub use machine::Machine;
pub use passwd::{PasswdEvent, PasswdFlow, PasswdState, PasswdStep};
pub use su::{SuOutcome, SuPrompt};
pub use sudo::{SudoGrant, SudoPrompt, SudoStep};
