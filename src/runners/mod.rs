//! # Runners: execution strategies for one emission.
//!
//! A [`Runner`] walks the candidate handlers of an [`Emission`] and decides
//! argument passing, result aggregation and short-circuiting.
//!
//! | Runner                 | Arguments per handler      | Resolves to                        |
//! |------------------------|----------------------------|------------------------------------|
//! | [`Sequence`]           | same initial args          | non-undefined results, in order    |
//! | [`Sequence::sync`]     | same initial args          | same, without ever suspending      |
//! | [`Pipeline`]           | previous normalized result | final argument list (memoized)     |
//! | [`Executor`]           | like pipeline              | like pipeline, skips protected ctx |
//!
//! ## Rules
//! - Handlers run one at a time in registration order; a handler's future
//!   settles before the next handler is called.
//! - A handler returning `false` halts the emission ([`Outcome::Halted`]).
//! - The first handler error (or panic) abandons the rest of the chain and is
//!   returned as [`RuntimeError::Handler`].
//! - A handler that consumes its last allowed invocation is unlinked before its
//!   callback runs.

mod emission;
mod executor;
mod pipeline;
mod sequence;

pub use emission::Emission;
pub use executor::Executor;
pub use pipeline::Pipeline;
pub use sequence::Sequence;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::callbacks::Args;
use crate::error::RuntimeError;

/// Shared handle to a runner.
pub type RunnerRef = Arc<dyn Runner>;

/// Execution strategy for one emission.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use sigvisor::{Emission, Outcome, Runner, RuntimeError};
///
/// /// Runs nothing and echoes the arguments.
/// struct Dry;
///
/// #[async_trait]
/// impl Runner for Dry {
///     fn name(&self) -> &'static str { "dry" }
///
///     async fn run(&self, emission: Emission) -> Result<Outcome, RuntimeError> {
///         Ok(Outcome::Completed(emission.args().clone()))
///     }
/// }
/// ```
#[async_trait]
pub trait Runner: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Runs the emission to completion.
    async fn run(&self, emission: Emission) -> Result<Outcome, RuntimeError>;

    /// Returns true when the runner skips handlers based on their context's
    /// phase. Such a runner cannot drive component lifecycle signals.
    fn filters_by_phase(&self) -> bool {
        false
    }
}

/// How an emission settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every eligible handler ran; carries the runner's result list.
    Completed(Args),
    /// A handler returned `false`.
    Halted,
}

impl Outcome {
    /// Returns true when a handler halted the emission.
    #[inline]
    pub fn is_halted(&self) -> bool {
        matches!(self, Outcome::Halted)
    }

    /// Result list of a completed emission.
    pub fn args(&self) -> Option<&Args> {
        match self {
            Outcome::Completed(args) => Some(args),
            Outcome::Halted => None,
        }
    }

    /// Flattens the outcome into values: a halt becomes `[false]`.
    pub fn into_values(self) -> Args {
        match self {
            Outcome::Completed(args) => args,
            Outcome::Halted => vec![Value::Bool(false)],
        }
    }
}

/// Built-in runner selector, used by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RunnerKind {
    /// [`Sequence`] (async).
    #[default]
    Sequence,
    /// [`Sequence::sync`].
    SyncSequence,
    /// [`Pipeline`].
    Pipeline,
    /// [`Executor`].
    Executor,
}

impl RunnerKind {
    /// Instantiates the runner.
    pub fn runner(self) -> RunnerRef {
        match self {
            RunnerKind::Sequence => Sequence::arc(),
            RunnerKind::SyncSequence => Arc::new(Sequence::sync()),
            RunnerKind::Pipeline => Pipeline::arc(),
            RunnerKind::Executor => Executor::arc(),
        }
    }

    /// Name of the runner this kind instantiates.
    pub fn as_str(self) -> &'static str {
        match self {
            RunnerKind::Sequence => "sequence",
            RunnerKind::SyncSequence => "sequence_sync",
            RunnerKind::Pipeline => "pipeline",
            RunnerKind::Executor => "executor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_names_match_runner_names() {
        for kind in [
            RunnerKind::Sequence,
            RunnerKind::SyncSequence,
            RunnerKind::Pipeline,
            RunnerKind::Executor,
        ] {
            assert_eq!(kind.runner().name(), kind.as_str());
            assert_eq!(kind.runner().filters_by_phase(), kind == RunnerKind::Executor);
        }
    }

    #[test]
    fn test_outcome_values() {
        assert_eq!(Outcome::Halted.into_values(), vec![json!(false)]);
        let done = Outcome::Completed(vec![json!(1)]);
        assert!(!done.is_halted());
        assert_eq!(done.args(), Some(&vec![json!(1)]));
    }
}
