//! Lifecycle states of a crawl engine
//!
//! ```text
//! Idle -> Running -> Draining -> Done
//!                 \-> Capped  -/
//! ```

use std::fmt;

/// Represents the current state of the crawl engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// Seed is queued, nothing has been claimed yet
    Idle,

    /// Rounds are being claimed and fetched
    Running,

    /// The frontier ran dry; no further rounds will start
    Draining,

    /// The URL cap was exceeded; no further rounds will start
    Capped,

    /// The HTTP session is closed and results are final
    Done,
}

impl EngineState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Checks whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: EngineState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Capped)
                | (Self::Draining, Self::Done)
                | (Self::Capped, Self::Done)
        )
    }

    /// Returns a short lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Capped => "capped",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
