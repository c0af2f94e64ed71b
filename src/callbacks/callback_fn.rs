//! # Function-backed callback (`CallbackFn`)
//!
//! [`CallbackFn`] wraps a closure `F: Fn(Invocation) -> Fut`, producing a fresh
//! future per call. [`SyncCallbackFn`] wraps a plain closure returning a
//! [`HandlerResult`] into a ready future.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use sigvisor::{CallbackFn, CallbackRef, Invocation, SyncCallbackFn};
//!
//! let async_cb: CallbackRef = CallbackFn::arc("fetch", |inv: Invocation| async move {
//!     Ok(Some(json!(inv.args.len())))
//! });
//! let sync_cb: CallbackRef = SyncCallbackFn::arc("noop", |_inv: Invocation| Ok(None));
//!
//! assert_eq!(async_cb.name(), "fetch");
//! assert_eq!(sync_cb.name(), "noop");
//! ```

use std::borrow::Cow;
use std::future::{Future, ready};
use std::sync::Arc;

use crate::callbacks::callback::{BoxHandlerFuture, Callback, HandlerResult, Invocation};

/// Function-backed callback implementation.
///
/// Wraps a closure that *creates* a new future per call.
#[derive(Debug)]
pub struct CallbackFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> CallbackFn<F> {
    /// Creates a new function-backed callback.
    ///
    /// Prefer [`CallbackFn::arc`] when you immediately need a
    /// [`CallbackRef`](crate::CallbackRef).
    pub fn new<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the callback and returns it as a shared handle.
    pub fn arc<Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: Fn(Invocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Arc::new(Self::new(name, f))
    }
}

/// Synchronous closure-backed callback.
///
/// The closure runs when [`Callback::call`] is invoked and its result is
/// wrapped in a ready future, so it never suspends. This is the callback
/// flavor expected by [`Emitter::emit_sync`](crate::Emitter::emit_sync).
#[derive(Debug)]
pub struct SyncCallbackFn<G> {
    name: Cow<'static, str>,
    f: G,
}

impl<G> SyncCallbackFn<G>
where
    G: Fn(Invocation) -> HandlerResult + Send + Sync + 'static,
{
    /// Creates a new synchronous callback.
    pub fn new(name: impl Into<Cow<'static, str>>, f: G) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the callback and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: G) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<G> Callback for SyncCallbackFn<G>
where
    G: Fn(Invocation) -> HandlerResult + Send + Sync + 'static,
{
    fn call(&self, invocation: Invocation) -> BoxHandlerFuture {
        Box::pin(ready((self.f)(invocation)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F, Fut> Callback for CallbackFn<F>
where
    F: Fn(Invocation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, invocation: Invocation) -> BoxHandlerFuture {
        Box::pin((self.f)(invocation))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
