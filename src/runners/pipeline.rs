//! # Pipeline runner.
//!
//! Each handler receives the normalized result of the previous one:
//!
//! ```text
//! args ─► h1 ─► [a, b] ─► h2 ─► –  ─► h3(a, b) ─► c ─► Completed([c])
//!                               (– = undefined keeps [a, b])
//! ```
//!
//! ## Normalization
//! ```text
//! None                 keep the previous argument list
//! Some(Array(items))   items become the next argument list
//! Some(Bool(false))    halt
//! Some(other)          [other]
//! ```
//!
//! On completion the final argument list becomes the list memory (replays
//! excepted). A halted pipeline leaves the memory untouched.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::callbacks::Args;
use crate::error::RuntimeError;
use crate::events::Handler;
use crate::runners::{Emission, Outcome, Runner};

/// Chains handlers, feeding each one the previous result.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pipeline;

impl Pipeline {
    /// Pipeline as a shared handle.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self)
    }
}

#[async_trait]
impl Runner for Pipeline {
    fn name(&self) -> &'static str {
        "pipeline"
    }

    async fn run(&self, emission: Emission) -> Result<Outcome, RuntimeError> {
        chain(emission, |_, _| true).await
    }
}

/// Turns a handler result into the next argument list.
pub(crate) fn normalize(result: Option<Value>, previous: Args) -> Args {
    match result {
        None => previous,
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    }
}

/// Shared chaining loop; handlers rejected by `eligible` are skipped without
/// being claimed and without touching the running arguments.
pub(crate) async fn chain(
    emission: Emission,
    eligible: fn(&Emission, &Handler) -> bool,
) -> Result<Outcome, RuntimeError> {
    let mut args = emission.args().clone();

    for handler in emission.candidates() {
        if !eligible(&emission, handler.as_ref()) {
            trace!(ty = emission.ty(), handler = %handler.id(), "handler filtered");
            continue;
        }
        let Some(fut) = emission.invoke(handler, args.clone()) else {
            continue;
        };
        match fut.await.map_err(|e| emission.fail(e))? {
            Some(Value::Bool(false)) => return Ok(Outcome::Halted),
            result => args = normalize(result, args),
        }
    }

    emission.memoize(&args);
    Ok(Outcome::Completed(args))
}
