//! Identity/session stack
//!
//! The stack only records what elevation replaced. Deciding whether an
//! elevation should happen at all (authentication, self-`su`) belongs to the
//! caller.

use crate::Identity;
use serde::{Deserialize, Serialize};

/// Identity and working directory saved when an elevation happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFrame {
    /// The identity that was acting before the elevation
    pub identity: Identity,
    /// Its working directory at that moment
    pub working_dir: String,
}

/// Result of popping the stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unwind {
    /// Return to a prior identity
    Restore(SessionFrame),
    /// No elevation was active; this is the outermost exit
    Outermost,
}

/// Ordered chain of saved frames, innermost last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStack {
    frames: Vec<SessionFrame>,
}

impl SessionStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Saves the current identity and directory before switching to `target`
    ///
    /// The caller switches the acting identity itself.
    pub fn elevate(&mut self, target: &Identity, current: &Identity, working_dir: &str) {
        tracing::debug!(
            from = %current,
            to = %target,
            depth = self.frames.len() + 1,
            "pushing session frame"
        );
        self.frames.push(SessionFrame {
            identity: current.clone(),
            working_dir: working_dir.to_string(),
        });
    }

    /// Pops the most recent frame
    pub fn unwind(&mut self) -> Unwind {
        match self.frames.pop() {
            Some(frame) => {
                tracing::debug!(to = %frame.identity, depth = self.frames.len(), "popping session frame");
                Unwind::Restore(frame)
            }
            None => Unwind::Outermost,
        }
    }

    /// Number of nested elevations currently active
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The identity that logged in, if any elevation is active
    pub fn bottom(&self) -> Option<&SessionFrame> {
        self.frames.first()
    }

    /// Frames from outermost to innermost
    pub fn frames(&self) -> impl Iterator<Item = &SessionFrame> {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, uid: u32) -> Identity {
        Identity::new(name, uid, uid, format!("/home/{}", name), "/bin/sh")
    }

    #[test]
    fn test_empty_stack_unwinds_to_outermost() {
        let mut stack = SessionStack::new();
        assert_eq!(stack.unwind(), Unwind::Outermost);
        assert_eq!(stack.unwind(), Unwind::Outermost);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_elevate_then_unwind() {
        let mut stack = SessionStack::new();
        let alice = user("alice", 1000);
        let root = Identity::root();

        stack.elevate(&root, &alice, "/home/alice/src");
        assert_eq!(stack.depth(), 1);

        match stack.unwind() {
            Unwind::Restore(frame) => {
                assert_eq!(frame.identity, alice);
                assert_eq!(frame.working_dir, "/home/alice/src");
            }
            Unwind::Outermost => panic!("expected a frame"),
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_symmetry_over_nested_elevations() {
        let mut stack = SessionStack::new();
        let chain = [user("a", 1001), user("b", 1002), user("c", 1003), Identity::root()];
        let dirs = ["/home/a", "/tmp", "/var/log"];

        for i in 0..3 {
            stack.elevate(&chain[i + 1], &chain[i], dirs[i]);
        }
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.bottom().map(|f| f.identity.username.as_str()), Some("a"));

        for i in (0..3).rev() {
            match stack.unwind() {
                Unwind::Restore(frame) => {
                    assert_eq!(frame.identity, chain[i]);
                    assert_eq!(frame.working_dir, dirs[i]);
                }
                Unwind::Outermost => panic!("stack emptied early"),
            }
        }
        assert_eq!(stack.unwind(), Unwind::Outermost);
    }

    #[test]
    fn test_frames_iterate_outermost_first() {
        let mut stack = SessionStack::new();
        stack.elevate(&user("b", 2), &user("a", 1), "/a");
        stack.elevate(&user("c", 3), &user("b", 2), "/b");
        let dirs: Vec<&str> = stack.frames().map(|f| f.working_dir.as_str()).collect();
        assert_eq!(dirs, vec!["/a", "/b"]);
    }
}
