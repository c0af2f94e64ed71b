//! # Registered handlers.
//!
//! A [`Handler`] is one `(context, callback)` pair bound to an event type on a
//! specific emitter. Handlers are created by `on`/`one` from a [`HandlerSpec`]
//! and are shared (`Arc<Handler>`) between the owning [`HandlerList`](crate::HandlerList)
//! and any emission currently running them.
//!
//! ## Bookkeeping
//! ```text
//! count    invocations so far; with a limit, the handler unlinks itself once
//!          count reaches limit
//! handled  generation of the last emission that ran this handler; a handler
//!          never runs twice for the same generation
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::callbacks::{CallbackRef, ContextRef, same_callback, same_context};
use crate::events::emitter::EmitterId;

/// Global sequence for handler identifiers.
static HANDLER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Unique handler identifier (never reused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    fn next() -> Self {
        Self(HANDLER_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

/// Registration request for a handler.
///
/// A bare [`CallbackRef`] converts into a spec with no context, data or limit;
/// use the builder methods for the rest.
///
/// ## Example
/// ```rust
/// use serde_json::json;
/// use sigvisor::{CallbackRef, HandlerSpec, SyncCallbackFn};
///
/// let cb: CallbackRef = SyncCallbackFn::arc("noop", |_| Ok(None));
/// let spec = HandlerSpec::new(cb).with_data(json!({"id": 7})).with_limit(3);
/// assert_eq!(spec.limit(), Some(3));
/// ```
#[derive(Clone)]
pub struct HandlerSpec {
    callback: CallbackRef,
    context: Option<ContextRef>,
    data: Option<Value>,
    limit: Option<u32>,
}

impl HandlerSpec {
    /// Creates a spec for `callback`.
    pub fn new(callback: CallbackRef) -> Self {
        Self {
            callback,
            context: None,
            data: None,
            limit: None,
        }
    }

    /// Binds the handler to an explicit context.
    #[inline]
    pub fn with_context(mut self, context: ContextRef) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches an opaque payload delivered with every invocation.
    #[inline]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Limits the number of invocations.
    #[inline]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Configured limit.
    #[inline]
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Configured context.
    #[inline]
    pub fn context(&self) -> Option<&ContextRef> {
        self.context.as_ref()
    }

    /// Configured callback.
    #[inline]
    pub fn callback(&self) -> &CallbackRef {
        &self.callback
    }

    pub(crate) fn into_handler(self, emitter: EmitterId, ty: Arc<str>) -> Handler {
        Handler {
            id: HandlerId::next(),
            emitter,
            ty,
            callback: self.callback,
            context: self.context,
            data: self.data,
            limit: self.limit,
            state: Mutex::new(HandlerState::default()),
        }
    }
}

impl From<CallbackRef> for HandlerSpec {
    fn from(callback: CallbackRef) -> Self {
        HandlerSpec::new(callback)
    }
}

impl From<&CallbackRef> for HandlerSpec {
    fn from(callback: &CallbackRef) -> Self {
        HandlerSpec::new(Arc::clone(callback))
    }
}

#[derive(Debug, Default)]
struct HandlerState {
    count: u32,
    handled: u64,
}

/// Outcome of [`Handler::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Claim {
    /// Already ran for this generation or limit reached.
    Skip,
    /// May run; `exhausted` when this call consumes the last allowed invocation.
    Run { exhausted: bool },
}

/// A single registered listener.
pub struct Handler {
    id: HandlerId,
    emitter: EmitterId,
    ty: Arc<str>,
    callback: CallbackRef,
    context: Option<ContextRef>,
    data: Option<Value>,
    limit: Option<u32>,
    state: Mutex<HandlerState>,
}

impl Handler {
    /// Unique identifier.
    #[inline]
    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Emitter this handler is registered on.
    #[inline]
    pub fn emitter(&self) -> EmitterId {
        self.emitter
    }

    /// Event type.
    #[inline]
    pub fn ty(&self) -> &str {
        &self.ty
    }

    /// Callback.
    #[inline]
    pub fn callback(&self) -> &CallbackRef {
        &self.callback
    }

    /// Explicit context; `None` means the emitter's owner.
    #[inline]
    pub fn context(&self) -> Option<&ContextRef> {
        self.context.as_ref()
    }

    /// Registration payload.
    #[inline]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Invocation limit.
    #[inline]
    pub fn limit(&self) -> Option<u32> {
        self.limit
    }

    /// Invocations so far.
    pub fn count(&self) -> u32 {
        self.state.lock().count
    }

    /// Generation of the last emission that ran this handler (`0` = never ran).
    pub fn handled(&self) -> u64 {
        self.state.lock().handled
    }

    /// Reserves an invocation for `generation`.
    pub(crate) fn claim(&self, generation: u64) -> Claim {
        let mut state = self.state.lock();
        if state.handled >= generation {
            return Claim::Skip;
        }
        if self.limit.is_some_and(|limit| state.count >= limit) {
            return Claim::Skip;
        }
        state.handled = generation;
        state.count += 1;
        Claim::Run {
            exhausted: self.limit.is_some_and(|limit| state.count >= limit),
        }
    }

    /// Matching rule of `off`: every given filter must match.
    pub(crate) fn matches(
        &self,
        context: Option<&ContextRef>,
        callback: Option<&CallbackRef>,
        owner: Option<&ContextRef>,
    ) -> bool {
        if let Some(cb) = callback {
            if !same_callback(cb, &self.callback) {
                return false;
            }
        }
        if let Some(ctx) = context {
            match self.context.as_ref().or(owner) {
                Some(own) if same_context(ctx, own) => {}
                _ => return false,
            }
        }
        true
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Handler")
            .field("id", &self.id)
            .field("emitter", &self.emitter)
            .field("ty", &self.ty)
            .field("callback", &self.callback.name())
            .field("context", &self.context.as_ref().map(|c| c.name().to_string()))
            .field("data", &self.data)
            .field("limit", &self.limit)
            .field("count", &state.count)
            .field("handled", &state.handled)
            .finish()
    }
}
