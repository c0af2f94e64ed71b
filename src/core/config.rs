//! # Application configuration.
//!
//! Provides [`Config`] centralized settings for the application bootstrap.
//!
//! Config is used in two ways:
//! 1. **Application creation**: `Application::builder(config)`
//! 2. **Component defaults**: components built through
//!    [`Application::component`](crate::Application::component) use
//!    `signal_runner`
//!
//! ## Sentinel values
//! - `grace = 0s` → wait for components to stop without a deadline

use std::time::Duration;

use crate::runners::RunnerKind;

/// Configuration for an [`Application`](crate::Application).
///
/// ## Field semantics
/// - `grace`: Maximum wait for all components to stop (`0s` = no deadline)
/// - `hub_runner`: Default runner of the hub's publications
/// - `signal_runner`: Default runner of each component's own emissions
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for graceful shutdown.
    ///
    /// When shutdown is requested:
    /// - Components are stopped in reverse start order
    /// - The application waits up to `grace` for all of them to finalize
    /// - If the deadline passes, returns `RuntimeError::GraceExceeded`
    pub grace: Duration,

    /// Runner the hub publishes through.
    ///
    /// The phase-aware executor by default, so components that are
    /// initializing or finalized do not receive live publications.
    pub hub_runner: RunnerKind,

    /// Runner used for component signals and local emissions.
    ///
    /// `RunnerKind::Executor` is rejected when a component is built: it would
    /// skip the component's own lifecycle handlers.
    pub signal_runner: RunnerKind,
}

impl Config {
    /// Returns the grace period as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → stop must complete within `d`
    #[inline]
    pub fn grace_limit(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 60s` (reasonable graceful shutdown window)
    /// - `hub_runner = RunnerKind::Executor`
    /// - `signal_runner = RunnerKind::Sequence`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(60),
            hub_runner: RunnerKind::Executor,
            signal_runner: RunnerKind::Sequence,
        }
    }
}
