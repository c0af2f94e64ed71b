//! # Handler callback abstraction.
//!
//! This module defines the [`Callback`] trait and the [`Invocation`] a callback receives.
//! The common handle type is [`CallbackRef`], an `Arc<dyn Callback>` suitable for
//! registering the same callback on several emitters and removing it later by identity.
//!
//! ## Return value contract
//! A callback resolves to a [`HandlerResult`]:
//! ```text
//! Ok(None)                     "undefined": keep the previous result / arguments
//! Ok(Some(Value::Bool(false))) halt: no further handler runs in this emission
//! Ok(Some(value))              a result (sequence) or the next arguments (pipeline)
//! Err(HandlerError)            abort the emission; the caller sees RuntimeError::Handler
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::callbacks::ContextRef;
use crate::error::HandlerError;

/// Ordered argument list passed between handlers.
pub type Args = Vec<Value>;

/// Result of a single handler call.
pub type HandlerResult = Result<Option<Value>, HandlerError>;

/// Boxed future returned by [`Callback::call`].
pub type BoxHandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'static>>;

/// # Shared handle to a callback object.
///
/// Identity of the `Arc` allocation is what `off(type, None, Some(callback))` matches.
pub type CallbackRef = Arc<dyn Callback>;

/// Everything one handler call receives.
#[derive(Clone)]
pub struct Invocation {
    /// Event type being emitted.
    pub ty: Arc<str>,
    /// Arguments for this call (initial args, or the previous pipeline result).
    pub args: Args,
    /// Opaque payload attached at registration time.
    pub data: Option<Value>,
    /// Execution context; `None` when the emitter has no owner.
    pub context: Option<ContextRef>,
}

impl Invocation {
    /// Returns the argument at `index`, if present.
    #[inline]
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.args.get(index)
    }
}

impl std::fmt::Debug for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("ty", &self.ty)
            .field("args", &self.args)
            .field("data", &self.data)
            .field("context", &self.context.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}

/// # Handler callback.
///
/// Every call produces a fresh future. A synchronous callback returns an
/// already-ready future (see [`SyncCallbackFn`](crate::SyncCallbackFn)),
/// which is what lets the same callback run under both the async runners and
/// the synchronous sequence runner.
///
/// # Example
/// ```
/// use serde_json::json;
/// use sigvisor::{BoxHandlerFuture, Callback, Invocation};
///
/// struct Double;
///
/// impl Callback for Double {
///     fn call(&self, inv: Invocation) -> BoxHandlerFuture {
///         let n = inv.arg(0).and_then(|v| v.as_i64()).unwrap_or(0);
///         Box::pin(async move { Ok(Some(json!(n * 2))) })
///     }
/// }
/// ```
pub trait Callback: Send + Sync + 'static {
    /// Starts one handler call.
    fn call(&self, invocation: Invocation) -> BoxHandlerFuture;

    /// Returns a human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Identity comparison for callbacks.
#[inline]
pub(crate) fn same_callback(a: &CallbackRef, b: &CallbackRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
