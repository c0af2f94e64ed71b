//! # One emission, as handed to a runner.
//!
//! [`Emission`] bundles everything a [`Runner`](crate::Runner) needs: the event
//! descriptor, the handler list it came from, the candidate snapshot, the
//! generation and the initial arguments. Runners only decide ordering and
//! aggregation; claiming, unlinking, panic capture and memoization go through
//! the helpers here so every runner applies them the same way.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::ready;
use tracing::trace;

use crate::callbacks::{Args, BoxHandlerFuture, ContextRef, HandlerResult, Invocation};
use crate::error::{HandlerError, RuntimeError};
use crate::events::{Event, Handler, ListRef};
use crate::events::handler::Claim;

/// A prepared emission.
pub struct Emission {
    event: Event,
    list: ListRef,
    owner: Option<ContextRef>,
    candidates: Vec<Arc<Handler>>,
    generation: u64,
    args: Args,
    replay: bool,
}

impl Emission {
    pub(crate) fn new(
        event: Event,
        list: ListRef,
        owner: Option<ContextRef>,
        candidates: Vec<Arc<Handler>>,
        generation: u64,
        args: Args,
    ) -> Self {
        Self {
            event,
            list,
            owner,
            candidates,
            generation,
            args,
            replay: false,
        }
    }

    /// Marks the emission as a memory replay: it never overwrites the memory.
    pub(crate) fn replay(mut self) -> Self {
        self.replay = true;
        self
    }

    /// Event type.
    #[inline]
    pub fn ty(&self) -> &str {
        self.event.ty()
    }

    /// Event descriptor.
    #[inline]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Handlers selected when the emission started, in list order.
    #[inline]
    pub fn candidates(&self) -> &[Arc<Handler>] {
        &self.candidates
    }

    /// Generation this emission runs under.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Initial arguments.
    #[inline]
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Returns true for a memory replay.
    #[inline]
    pub fn is_replay(&self) -> bool {
        self.replay
    }

    /// Effective context of `handler`: its own, else the emitter's owner.
    pub fn context_of(&self, handler: &Handler) -> Option<ContextRef> {
        handler.context().or(self.owner.as_ref()).cloned()
    }

    /// Claims `handler` for this generation and starts its callback with `args`.
    ///
    /// Returns `None` when the handler must not run (already handled this or a
    /// newer generation, or its limit is used up). Panics raised while creating
    /// or polling the future resolve to [`HandlerError::Panicked`].
    ///
    /// A handler claiming its last allowed invocation is unlinked here,
    /// directly from the list; owners are not notified.
    pub fn invoke(&self, handler: &Arc<Handler>, args: Args) -> Option<BoxHandlerFuture> {
        match handler.claim(self.generation) {
            Claim::Skip => {
                trace!(ty = self.ty(), handler = %handler.id(), "handler skipped");
                return None;
            }
            Claim::Run { exhausted: true } => {
                self.list.lock().remove(handler.id());
                trace!(ty = self.ty(), handler = %handler.id(), "handler exhausted");
            }
            Claim::Run { exhausted: false } => {}
        }

        let invocation = Invocation {
            ty: self.event.type_arc(),
            args,
            data: handler.data().cloned(),
            context: self.context_of(handler),
        };
        let callback = Arc::clone(handler.callback());

        let fut: BoxHandlerFuture =
            match std::panic::catch_unwind(AssertUnwindSafe(|| callback.call(invocation))) {
                Ok(fut) => Box::pin(AssertUnwindSafe(fut).catch_unwind().map(|res| match res {
                    Ok(result) => result,
                    Err(payload) => Err(HandlerError::from_panic(payload)),
                })),
                Err(payload) => Box::pin(ready::<HandlerResult>(Err(HandlerError::from_panic(payload)))),
            };
        Some(fut)
    }

    /// Stores `args` as the list memory, unless this is a replay.
    pub fn memoize(&self, args: &Args) {
        if !self.replay {
            self.list.lock().set_memory(self.generation, args.clone());
        }
    }

    /// Wraps a handler failure for the caller.
    pub fn fail(&self, error: HandlerError) -> RuntimeError {
        RuntimeError::Handler {
            ty: self.ty().to_string(),
            source: error,
        }
    }
}

impl std::fmt::Debug for Emission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emission")
            .field("event", &self.event)
            .field("candidates", &self.candidates.len())
            .field("generation", &self.generation)
            .field("args", &self.args)
            .field("replay", &self.replay)
            .finish()
    }
}
