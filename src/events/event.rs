//! # Event descriptor accepted by [`Emitter::emit`](crate::Emitter::emit).
//!
//! An [`Event`] is either built from a bare type string (the emitter's default
//! runner is used) or constructed explicitly to override the runner and to
//! target a subset of handlers:
//!
//! - `runner`: execution strategy for this emission only;
//! - `scope`: only handlers bound to this context run;
//! - `callback`: only handlers registered with this callback run.
//!
//! `scope` and `callback` are combined with AND; they are what makes targeted
//! re-emission ("replay only to handler X") possible.
//!
//! ## Example
//! ```rust
//! use sigvisor::{Event, Pipeline};
//!
//! let plain: Event = "on/resize".into();
//! assert_eq!(plain.ty(), "on/resize");
//! assert!(plain.runner().is_none());
//!
//! let piped = Event::new("hub/window/size").with_runner(Pipeline::arc());
//! assert_eq!(piped.runner().map(|r| r.name()), Some("pipeline"));
//! ```

use std::sync::Arc;

use crate::callbacks::{CallbackRef, ContextRef, same_callback, same_context};
use crate::error::RuntimeError;
use crate::events::handler::Handler;
use crate::runners::RunnerRef;

/// Event descriptor: type plus optional runner override and handler filters.
#[derive(Clone)]
pub struct Event {
    ty: Arc<str>,
    runner: Option<RunnerRef>,
    scope: Option<ContextRef>,
    callback: Option<CallbackRef>,
}

impl Event {
    /// Creates a descriptor for `ty` with no overrides.
    pub fn new(ty: impl Into<Arc<str>>) -> Self {
        Self {
            ty: ty.into(),
            runner: None,
            scope: None,
            callback: None,
        }
    }

    /// Overrides the runner for this emission.
    #[inline]
    pub fn with_runner(mut self, runner: RunnerRef) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Restricts the emission to handlers bound to `scope`.
    #[inline]
    pub fn with_scope(mut self, scope: ContextRef) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Restricts the emission to handlers registered with `callback`.
    #[inline]
    pub fn with_callback(mut self, callback: CallbackRef) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Event type.
    #[inline]
    pub fn ty(&self) -> &str {
        &self.ty
    }

    /// Runner override, if any.
    #[inline]
    pub fn runner(&self) -> Option<&RunnerRef> {
        self.runner.as_ref()
    }

    /// Scope filter, if any.
    #[inline]
    pub fn scope(&self) -> Option<&ContextRef> {
        self.scope.as_ref()
    }

    /// Callback filter, if any.
    #[inline]
    pub fn callback(&self) -> Option<&CallbackRef> {
        self.callback.as_ref()
    }

    pub(crate) fn type_arc(&self) -> Arc<str> {
        Arc::clone(&self.ty)
    }

    /// Rejects descriptors without a type.
    pub(crate) fn validate(&self) -> Result<(), RuntimeError> {
        if self.ty.is_empty() {
            return Err(RuntimeError::invalid_argument("event type must not be empty"));
        }
        Ok(())
    }

    /// Returns true when `handler` passes the scope and callback filters.
    ///
    /// `owner` is the emitter's own context, used for handlers registered
    /// without an explicit one.
    pub(crate) fn selects(&self, handler: &Handler, owner: Option<&ContextRef>) -> bool {
        if let Some(cb) = &self.callback {
            if !same_callback(cb, handler.callback()) {
                return false;
            }
        }
        if let Some(scope) = &self.scope {
            match handler.context().or(owner) {
                Some(ctx) if same_context(scope, ctx) => {}
                _ => return false,
            }
        }
        true
    }
}

impl From<&str> for Event {
    fn from(ty: &str) -> Self {
        Event::new(ty)
    }
}

impl From<String> for Event {
    fn from(ty: String) -> Self {
        Event::new(ty)
    }
}

impl From<Arc<str>> for Event {
    fn from(ty: Arc<str>) -> Self {
        Event::new(ty)
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("ty", &self.ty)
            .field("runner", &self.runner.as_ref().map(|r| r.name()))
            .field("scope", &self.scope.as_ref().map(|s| s.name().to_string()))
            .field("callback", &self.callback.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}
