//! # Hub: publish/subscribe over a shared emitter.
//!
//! The [`Hub`] is the broker components use to talk without holding references
//! to each other. It is a cheap handle (`Clone`) over one [`Emitter`] whose
//! default runner is the phase-aware [`Executor`], so publications are chained
//! like a pipeline and skip subscribers that are initializing or finalized.
//!
//! ## Memory
//! ```text
//! publish("window/size", [800, 600])
//!   └─► runner completes ─► list.memory = final args
//!
//! subscribe("window/size", late)
//! republish("window/size", None, Some(late))
//!   └─► memory replayed to handlers that did not handle the publication
//!       that produced it
//!       (earlier subscribers are not called again)
//! ```
//!
//! ## Rules
//! - One hub per application, created by the bootstrap and passed to the
//!   components that need it.
//! - `peek` is a pure read.
//! - `republish` on a topic without memory resolves immediately with no
//!   handler called.

use std::sync::Arc;

use tracing::debug;

use crate::callbacks::{Args, CallbackRef, ContextRef};
use crate::error::RuntimeError;
use crate::events::{Emitter, Event, Handler, HandlerSpec};
use crate::runners::{Executor, Outcome, RunnerRef};

/// Publish/subscribe broker with topic memory.
///
/// # Example
/// ```rust
/// use serde_json::json;
/// use sigvisor::{CallbackRef, Hub, Invocation, SyncCallbackFn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), sigvisor::RuntimeError> {
/// let hub = Hub::new();
/// hub.publish("window/size", vec![json!(800), json!(600)]).await?;
///
/// let late: CallbackRef = SyncCallbackFn::arc("late", |inv: Invocation| {
///     assert_eq!(inv.args, vec![json!(800), json!(600)]);
///     Ok(None)
/// });
/// hub.subscribe("window/size", late.clone())?;
/// hub.republish("window/size", None, Some(late)).await?;
///
/// assert_eq!(hub.peek("window/size", vec![]), vec![json!(800), json!(600)]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Hub {
    emitter: Arc<Emitter>,
}

impl Hub {
    /// Creates a hub publishing through the [`Executor`].
    pub fn new() -> Self {
        Self::with_runner(Executor::arc())
    }

    /// Creates a hub publishing through `runner` by default.
    pub fn with_runner(runner: RunnerRef) -> Self {
        Self {
            emitter: Arc::new(Emitter::with_runner(runner)),
        }
    }

    /// Underlying emitter.
    #[inline]
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Subscribes a handler to `topic`.
    pub fn subscribe(&self, topic: &str, spec: impl Into<HandlerSpec>) -> Result<Arc<Handler>, RuntimeError> {
        self.emitter.add(topic, spec.into())
    }

    /// Removes the subscriptions of `topic` matching the given filters.
    pub fn unsubscribe(
        &self,
        topic: &str,
        context: Option<&ContextRef>,
        callback: Option<&CallbackRef>,
    ) -> Vec<Arc<Handler>> {
        self.emitter.off(topic, context, callback)
    }

    /// Publishes `args` on `topic` with the default runner.
    pub async fn publish(&self, topic: &str, args: Args) -> Result<Outcome, RuntimeError> {
        self.emitter.emit(topic, args).await
    }

    /// Publishes with an explicit descriptor (runner override, scope, callback).
    pub async fn publish_with(&self, event: impl Into<Event>, args: Args) -> Result<Outcome, RuntimeError> {
        self.emitter.emit(event, args).await
    }

    /// Replays the memory of `topic` to the matching handlers that have not
    /// handled the publication that produced it.
    ///
    /// With no memory recorded yet, resolves to `Completed([])` and calls nothing.
    pub async fn republish(
        &self,
        topic: &str,
        context: Option<ContextRef>,
        callback: Option<CallbackRef>,
    ) -> Result<Outcome, RuntimeError> {
        let mut event = Event::new(topic);
        if let Some(context) = context {
            event = event.with_scope(context);
        }
        if let Some(callback) = callback {
            event = event.with_callback(callback);
        }
        debug!(topic, "republish");
        self.emitter.reemit(event).await
    }

    /// Current memory of `topic`, or `fallback` when nothing was recorded.
    pub fn peek(&self, topic: &str, fallback: Args) -> Args {
        self.emitter.peek(topic).unwrap_or(fallback)
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub").field("emitter", &self.emitter).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use serde_json::{Value, json};

    use super::*;
    use crate::callbacks::{Detached, Invocation, SyncCallbackFn};

    fn recorder(seen: &Arc<Mutex<Vec<Args>>>) -> CallbackRef {
        let seen = Arc::clone(seen);
        SyncCallbackFn::arc("recorder", move |inv: Invocation| {
            seen.lock().push(inv.args);
            Ok(None)
        })
    }

    #[tokio::test]
    async fn test_republish_replays_memory_to_late_subscriber_only() {
        let hub = Hub::new();
        let early_calls = Arc::new(AtomicUsize::new(0));
        let early: CallbackRef = {
            let calls = Arc::clone(&early_calls);
            SyncCallbackFn::arc("early", move |_inv: Invocation| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            })
        };
        hub.subscribe("topic", early).unwrap();
        hub.publish("topic", vec![json!(1), json!(2)]).await.unwrap();
        assert_eq!(early_calls.load(Ordering::SeqCst), 1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let late = recorder(&seen);
        hub.subscribe("topic", &late).unwrap();
        hub.republish("topic", None, Some(Arc::clone(&late))).await.unwrap();

        assert_eq!(*seen.lock(), vec![vec![json!(1), json!(2)]]);
        assert_eq!(early_calls.load(Ordering::SeqCst), 1);

        // already handled the remembered publication: no duplicate delivery
        hub.republish("topic", None, None).await.unwrap();
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(early_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_republish_without_memory_calls_nothing() {
        let hub = Hub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        hub.subscribe("topic", recorder(&seen)).unwrap();

        let out = hub.republish("topic", None, None).await.unwrap();
        assert_eq!(out, Outcome::Completed(vec![]));
        assert!(seen.lock().is_empty());

        let out = hub.republish("never/published", None, None).await.unwrap();
        assert_eq!(out, Outcome::Completed(vec![]));
    }

    #[tokio::test]
    async fn test_republish_with_no_handlers_resolves_from_memory() {
        let hub = Hub::new();
        hub.publish("topic", vec![json!("v")]).await.unwrap();
        let out = hub.republish("topic", None, None).await.unwrap();
        assert_eq!(out, Outcome::Completed(vec![json!("v")]));
    }

    #[tokio::test]
    async fn test_publish_chains_and_memoizes() {
        let hub = Hub::new();
        let inc: CallbackRef = SyncCallbackFn::arc("inc", |inv: Invocation| {
            Ok(inv.arg(0).and_then(Value::as_i64).map(|n| json!(n + 1)))
        });
        hub.subscribe("counter", Arc::clone(&inc)).unwrap();
        hub.subscribe("counter", inc).unwrap();

        let out = hub.publish("counter", vec![json!(1)]).await.unwrap();
        assert_eq!(out, Outcome::Completed(vec![json!(3)]));
        assert_eq!(hub.peek("counter", vec![]), vec![json!(3)]);
        assert_eq!(hub.peek("missing", vec![json!("fallback")]), vec![json!("fallback")]);
    }

    #[tokio::test]
    async fn test_unsubscribe_by_context() {
        let hub = Hub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ctx: ContextRef = Detached::arc("widget");
        hub.subscribe("topic", HandlerSpec::new(recorder(&seen)).with_context(Arc::clone(&ctx)))
            .unwrap();
        hub.subscribe("topic", recorder(&seen)).unwrap();

        assert_eq!(hub.unsubscribe("topic", Some(&ctx), None).len(), 1);
        hub.publish("topic", vec![json!(1)]).await.unwrap();
        assert_eq!(seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_targeted_republish_by_scope() {
        let hub = Hub::new();
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));
        let a: ContextRef = Detached::arc("a");
        let b: ContextRef = Detached::arc("b");

        hub.publish("topic", vec![json!(7)]).await.unwrap();
        hub.subscribe("topic", HandlerSpec::new(recorder(&seen_a)).with_context(Arc::clone(&a)))
            .unwrap();
        hub.subscribe("topic", HandlerSpec::new(recorder(&seen_b)).with_context(b)).unwrap();

        hub.republish("topic", Some(a), None).await.unwrap();
        assert_eq!(seen_a.lock().len(), 1);
        assert!(seen_b.lock().is_empty());
    }

    #[tokio::test]
    async fn test_halted_publish_does_not_reopen_memory() {
        let hub = Hub::new();
        let gate: CallbackRef = SyncCallbackFn::arc("gate", |inv: Invocation| {
            Ok(inv.arg(0).filter(|v| v.as_bool() == Some(false)).cloned())
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        hub.subscribe("topic", gate).unwrap();
        hub.subscribe("topic", recorder(&seen)).unwrap();

        hub.publish("topic", vec![json!(1)]).await.unwrap();
        let out = hub.publish("topic", vec![json!(false)]).await.unwrap();
        assert!(out.is_halted());
        assert_eq!(hub.peek("topic", vec![]), vec![json!(1)]);

        hub.republish("topic", None, None).await.unwrap();
        assert_eq!(*seen.lock(), vec![vec![json!(1)]]);

        let late = recorder(&seen);
        hub.subscribe("topic", &late).unwrap();
        hub.republish("topic", None, None).await.unwrap();
        assert_eq!(*seen.lock(), vec![vec![json!(1)], vec![json!(1)]]);
    }

    #[tokio::test]
    async fn test_failed_publish_does_not_reopen_memory() {
        let hub = Hub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        hub.subscribe("topic", recorder(&seen)).unwrap();
        let picky: CallbackRef = SyncCallbackFn::arc("picky", |inv: Invocation| -> crate::callbacks::HandlerResult {
            if inv.arg(0) == Some(&json!("bad")) {
                return Err(crate::error::HandlerError::fail("rejected"));
            }
            Ok(None)
        });
        hub.subscribe("topic", picky).unwrap();

        hub.publish("topic", vec![json!("good")]).await.unwrap();
        assert!(hub.publish("topic", vec![json!("bad")]).await.is_err());
        hub.republish("topic", None, None).await.unwrap();
        assert_eq!(*seen.lock(), vec![vec![json!("good")], vec![json!("bad")]]);
    }
}
