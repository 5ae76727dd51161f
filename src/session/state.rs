//! Session lifecycle states.

use std::fmt;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No device held. Every operation is a no-op.
    Closed,
    /// Device held, preview not running.
    Open,
    /// Device held and streaming frames.
    Previewing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Closed => "closed",
            SessionState::Open => "open",
            SessionState::Previewing => "previewing",
        };
        f.write_str(name)
    }
}
