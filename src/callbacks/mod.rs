//! # Handler callbacks and execution contexts.
//!
//! This module provides the callback-related types:
//! - [`Callback`] - trait for implementing handler callbacks (sync or async)
//! - [`CallbackFn`] - closure-based async callback implementation
//! - [`SyncCallbackFn`] - closure-based synchronous callback implementation
//! - [`CallbackRef`] - shared reference to a callback (`Arc<dyn Callback>`)
//! - [`Invocation`] - what a single handler call receives
//! - [`Context`] / [`ContextRef`] - the execution scope a handler is bound to
//!
//! Callbacks and contexts are compared by **identity** (pointer equality),
//! which is how `off`, scoped emissions and `republish` target a handler.

mod callback;
mod callback_fn;
mod context;

pub use callback::{Args, BoxHandlerFuture, Callback, CallbackRef, HandlerResult, Invocation};
pub use callback_fn::{CallbackFn, SyncCallbackFn};
pub use context::{Context, ContextRef, Detached};

pub(crate) use callback::same_callback;
pub(crate) use context::same_context;
