//! # Emitter: handler registry plus emission entry point.
//!
//! An [`Emitter`] owns one [`HandlerList`] per event type and delegates the
//! actual execution of an emission to a [`Runner`](crate::Runner).
//!
//! ## Emission flow
//! ```text
//! emit(event, args)
//!   ├─► validate event (InvalidArgument on empty type)
//!   ├─► list = handlers[type] (created lazily)
//!   ├─► lock list:
//!   │     generation = ++list.handled
//!   │     candidates = handlers passing scope/callback filters
//!   ├─► unlock
//!   └─► runner.run(Emission { event, list, candidates, generation, args })
//! ```
//!
//! ## Rules
//! - Locks are never held while a callback runs, so handlers may call
//!   `on`/`off`/`emit` on the same emitter.
//! - Handlers registered during an emission are not part of it.
//! - A handler runs at most once per generation, and never for a generation
//!   older than the last one it handled.
//! - `off` only unlinks; an emission that already selected the handler still
//!   owns its `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::callbacks::{Args, CallbackRef, Context, ContextRef};
use crate::error::{HandlerError, RuntimeError};
use crate::events::event::Event;
use crate::events::handler::{Handler, HandlerSpec};
use crate::events::list::HandlerList;
use crate::runners::{Emission, Outcome, Runner, RunnerRef, Sequence};

/// Global sequence for emitter identifiers.
static EMITTER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Shared, lockable handler list.
pub(crate) type ListRef = Arc<Mutex<HandlerList>>;

/// Unique emitter identifier, the back-reference every [`Handler`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(u64);

impl EmitterId {
    pub(crate) fn next() -> Self {
        Self(EMITTER_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Event emitter with per-type handler lists and a default runner.
///
/// # Example
/// ```rust
/// use serde_json::json;
/// use sigvisor::{CallbackRef, Emitter, Invocation, Outcome, SyncCallbackFn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), sigvisor::RuntimeError> {
/// let emitter = Emitter::new();
/// let double: CallbackRef = SyncCallbackFn::arc("double", |inv: Invocation| {
///     Ok(inv.arg(0).and_then(|v| v.as_i64()).map(|n| json!(n * 2)))
/// });
/// emitter.on("on/number", double)?;
///
/// let out = emitter.emit("on/number", vec![json!(21)]).await?;
/// assert_eq!(out, Outcome::Completed(vec![json!(42)]));
/// # Ok(())
/// # }
/// ```
pub struct Emitter {
    id: EmitterId,
    owner: Option<Weak<dyn Context>>,
    runner: RunnerRef,
    handlers: Mutex<HashMap<Arc<str>, ListRef>>,
}

impl Emitter {
    /// Creates an emitter without owner whose default runner is [`Sequence`].
    pub fn new() -> Self {
        Self::with_runner(Sequence::arc())
    }

    /// Creates an emitter without owner using `runner` by default.
    pub fn with_runner(runner: RunnerRef) -> Self {
        Self {
            id: EmitterId::next(),
            owner: None,
            runner,
            handlers: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an emitter whose handlers default to `owner` as their context.
    ///
    /// The owner is held weakly: it usually owns the emitter.
    pub fn owned_by(owner: Weak<dyn Context>, runner: RunnerRef) -> Self {
        Self {
            owner: Some(owner),
            ..Self::with_runner(runner)
        }
    }

    /// Emitter identifier.
    #[inline]
    pub fn id(&self) -> EmitterId {
        self.id
    }

    /// Default runner.
    #[inline]
    pub fn runner(&self) -> &RunnerRef {
        &self.runner
    }

    /// Owner context, if set and still alive.
    pub fn owner(&self) -> Option<ContextRef> {
        self.owner.as_ref().and_then(Weak::upgrade)
    }

    /// Appends a handler for `ty`; returns `self` for chaining.
    ///
    /// Fails with [`RuntimeError::InvalidArgument`] when `ty` is empty or the
    /// limit is zero.
    pub fn on(&self, ty: &str, spec: impl Into<HandlerSpec>) -> Result<&Self, RuntimeError> {
        self.add(ty, spec.into())?;
        Ok(self)
    }

    /// Appends a handler for `ty` that runs at most once.
    pub fn one(&self, ty: &str, spec: impl Into<HandlerSpec>) -> Result<&Self, RuntimeError> {
        self.add(ty, spec.into().with_limit(1))?;
        Ok(self)
    }

    /// Appends a handler and returns it.
    pub fn add(&self, ty: &str, spec: HandlerSpec) -> Result<Arc<Handler>, RuntimeError> {
        if ty.is_empty() {
            return Err(RuntimeError::invalid_argument("event type must not be empty"));
        }
        if spec.limit() == Some(0) {
            return Err(RuntimeError::invalid_argument(format!(
                "handler limit for {ty} must be at least 1"
            )));
        }

        let list = self.list(ty);
        let mut guard = list.lock();
        let handler = Arc::new(spec.into_handler(self.id, Arc::from(guard.ty())));
        guard.push(Arc::clone(&handler));
        trace!(emitter = %self.id, ty, handler = %handler.id(), "handler added");
        Ok(handler)
    }

    /// Unlinks the handlers of `ty` matching every given filter.
    ///
    /// With neither `context` nor `callback`, every handler of `ty` is removed.
    /// Returns the removed handlers (empty when nothing matched).
    pub fn off(
        &self,
        ty: &str,
        context: Option<&ContextRef>,
        callback: Option<&CallbackRef>,
    ) -> Vec<Arc<Handler>> {
        let Some(list) = self.existing(ty) else {
            return Vec::new();
        };
        let owner = self.owner();
        let removed = list
            .lock()
            .remove_where(|h| h.matches(context, callback, owner.as_ref()));
        if !removed.is_empty() {
            trace!(emitter = %self.id, ty, removed = removed.len(), "handlers removed");
        }
        removed
    }

    /// Emits `event` with `args` through the event's runner (or the default one).
    pub async fn emit(&self, event: impl Into<Event>, args: Args) -> Result<Outcome, RuntimeError> {
        let event = event.into();
        let runner = event.runner().cloned().unwrap_or_else(|| Arc::clone(&self.runner));
        let emission = self.prepare(event, args)?;
        debug!(
            emitter = %self.id,
            ty = emission.ty(),
            generation = emission.generation(),
            candidates = emission.candidates().len(),
            runner = runner.name(),
            "emit"
        );
        runner.run(emission).await
    }

    /// Emits `event` synchronously through [`Sequence::sync`].
    ///
    /// Every handler must complete on first poll; a handler returning a
    /// pending future fails the emission with [`HandlerError::Suspended`].
    /// A runner override on `event` is ignored.
    pub fn emit_sync(&self, event: impl Into<Event>, args: Args) -> Result<Outcome, RuntimeError> {
        let emission = self.prepare(event.into(), args)?;
        let ty = emission.ty().to_string();
        trace!(emitter = %self.id, ty = %ty, generation = emission.generation(), "emit_sync");
        Sequence::sync()
            .run(emission)
            .now_or_never()
            .unwrap_or(Err(RuntimeError::Handler {
                ty,
                source: HandlerError::Suspended,
            }))
    }

    /// Replays the memory of `event`'s type to handlers that did not handle
    /// the generation that produced it (or a newer one).
    ///
    /// Resolves to `Completed([])` without calling anything when nothing has
    /// been memoized yet, and to `Completed(memory)` when no handler is
    /// eligible. The replay never overwrites the memory.
    pub async fn reemit(&self, event: impl Into<Event>) -> Result<Outcome, RuntimeError> {
        let event = event.into();
        event.validate()?;
        let runner = event.runner().cloned().unwrap_or_else(|| Arc::clone(&self.runner));
        let list = self.list(event.ty());
        let owner = self.owner();

        let (memory, generation, candidates) = {
            let guard = list.lock();
            let (Some(memory), Some(generation)) = (guard.memory().cloned(), guard.memory_generation())
            else {
                return Ok(Outcome::Completed(Vec::new()));
            };
            let candidates = guard.snapshot(generation, |h| event.selects(h, owner.as_ref()));
            (memory, generation, candidates)
        };

        if candidates.is_empty() {
            return Ok(Outcome::Completed(memory));
        }

        debug!(
            emitter = %self.id,
            ty = event.ty(),
            generation,
            candidates = candidates.len(),
            runner = runner.name(),
            "reemit"
        );
        let emission = Emission::new(event, list, owner, candidates, generation, memory).replay();
        runner.run(emission).await
    }

    /// Memoized arguments of the last completed emission of `ty`.
    pub fn peek(&self, ty: &str) -> Option<Args> {
        self.existing(ty).and_then(|list| list.lock().memory().cloned())
    }

    /// Snapshot of the handlers currently linked for `ty`, in order.
    pub fn handlers(&self, ty: &str) -> Vec<Arc<Handler>> {
        self.existing(ty)
            .map(|list| list.lock().iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns true when at least one handler is linked for `ty`.
    pub fn has_handlers(&self, ty: &str) -> bool {
        self.existing(ty).is_some_and(|list| !list.lock().is_empty())
    }

    /// Sorted list of types that have a handler list.
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.lock().keys().map(|k| k.to_string()).collect();
        types.sort_unstable();
        types
    }

    /// Runs `f` against the list of `ty` (created lazily).
    pub fn inspect<R>(&self, ty: &str, f: impl FnOnce(&HandlerList) -> R) -> R {
        let list = self.list(ty);
        let guard = list.lock();
        f(&guard)
    }

    fn existing(&self, ty: &str) -> Option<ListRef> {
        self.handlers.lock().get(ty).cloned()
    }

    fn list(&self, ty: &str) -> ListRef {
        let mut handlers = self.handlers.lock();
        if let Some(list) = handlers.get(ty) {
            return Arc::clone(list);
        }
        let key: Arc<str> = Arc::from(ty);
        let list = Arc::new(Mutex::new(HandlerList::new(Arc::clone(&key))));
        handlers.insert(key, Arc::clone(&list));
        list
    }

    fn prepare(&self, event: Event, args: Args) -> Result<Emission, RuntimeError> {
        event.validate()?;
        let list = self.list(event.ty());
        let owner = self.owner();
        let (generation, candidates) = {
            let mut guard = list.lock();
            let generation = guard.next_generation();
            let candidates = guard.snapshot(generation, |h| event.selects(h, owner.as_ref()));
            (generation, candidates)
        };
        Ok(Emission::new(event, list, owner, candidates, generation, args))
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("id", &self.id)
            .field("runner", &self.runner.name())
            .field("types", &self.types())
            .finish()
    }
}
