//! # Lifecycle phases.
//!
//! ```text
//! absent ─► initialize ─► initialized ─► start ─► started
//!                                                   │
//! finalized ◄─ finalize ◄─ stopped ◄─ stop ◄────────┘
//!     └──────► initialize (restart)
//! ```
//!
//! ## Rules
//! - `start` is accepted from `absent` and `finalized` only.
//! - `stop` is accepted from `started` only.
//! - `initialize`, `initialized`, `finalize` and `finalized` are *protected*:
//!   the phase-aware [`Executor`](crate::Executor) skips handlers of a context
//!   in one of them.

use std::fmt;

/// Lifecycle phase of a component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Constructed, never started.
    #[default]
    Absent,
    /// `sig/initialize` is running.
    Initialize,
    /// `sig/initialize` settled.
    Initialized,
    /// `sig/start` is running.
    Start,
    /// `sig/start` settled.
    Started,
    /// `sig/stop` is running.
    Stop,
    /// `sig/stop` settled.
    Stopped,
    /// `sig/finalize` is running.
    Finalize,
    /// `sig/finalize` settled; the component may be started again.
    Finalized,
}

impl Phase {
    /// Lowercase phase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Absent => "absent",
            Phase::Initialize => "initialize",
            Phase::Initialized => "initialized",
            Phase::Start => "start",
            Phase::Started => "started",
            Phase::Stop => "stop",
            Phase::Stopped => "stopped",
            Phase::Finalize => "finalize",
            Phase::Finalized => "finalized",
        }
    }

    /// Returns true for the phases the executor skips.
    #[inline]
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Phase::Initialize | Phase::Initialized | Phase::Finalize | Phase::Finalized
        )
    }

    /// Returns true when `start` is allowed.
    #[inline]
    pub fn can_start(self) -> bool {
        matches!(self, Phase::Absent | Phase::Finalized)
    }

    /// Returns true when `stop` is allowed.
    #[inline]
    pub fn can_stop(self) -> bool {
        matches!(self, Phase::Started)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards() {
        assert!(Phase::Absent.can_start());
        assert!(Phase::Finalized.can_start());
        assert!(!Phase::Started.can_start());
        assert!(Phase::Started.can_stop());
        assert!(!Phase::Stopped.can_stop());
    }

    #[test]
    fn test_protected_set() {
        let protected: Vec<_> = [
            Phase::Absent,
            Phase::Initialize,
            Phase::Initialized,
            Phase::Start,
            Phase::Started,
            Phase::Stop,
            Phase::Stopped,
            Phase::Finalize,
            Phase::Finalized,
        ]
        .into_iter()
        .filter(|p| p.is_protected())
        .map(Phase::as_str)
        .collect();
        assert_eq!(protected, ["initialize", "initialized", "finalize", "finalized"]);
    }
}
