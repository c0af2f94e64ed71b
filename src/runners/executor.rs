//! # Phase-aware executor.
//!
//! [`Executor`] chains handlers exactly like [`Pipeline`](crate::Pipeline) but
//! first consults the phase of each handler's effective context. Handlers whose
//! context is in a protected phase are skipped: they are not claimed and they
//! do not affect the running arguments.
//!
//! ## Protected phases
//! ```text
//! initialize  initialized  finalize  finalized
//! ```
//! A component that is still initializing (or already finalized) therefore
//! misses live publications; it catches up through `republish` once started.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RuntimeError;
use crate::events::Handler;
use crate::runners::pipeline::chain;
use crate::runners::{Emission, Outcome, Runner};

/// Pipeline that skips handlers of contexts in a protected phase.
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor;

impl Executor {
    /// Executor as a shared handle.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self)
    }
}

fn accepts(emission: &Emission, handler: &Handler) -> bool {
    emission
        .context_of(handler)
        .and_then(|ctx| ctx.phase())
        .is_none_or(|phase| !phase.is_protected())
}

#[async_trait]
impl Runner for Executor {
    fn name(&self) -> &'static str {
        "executor"
    }

    async fn run(&self, emission: Emission) -> Result<Outcome, RuntimeError> {
        chain(emission, accepts).await
    }

    fn filters_by_phase(&self) -> bool {
        true
    }
}
