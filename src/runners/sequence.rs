//! # Sequence runner.
//!
//! Every handler receives the same initial arguments; results are collected.
//!
//! ```text
//! args ─► h1 ─► r1 ┐
//! args ─► h2 ─► –  ├─► Completed([r1, r3])     (– = undefined, dropped)
//! args ─► h3 ─► r3 ┘
//! args ─► hN ─► false ─► Halted                (rest never called)
//! ```
//!
//! ## Rules
//! - No eligible handler at all: resolves `Completed(initial args)`.
//! - On completion the initial arguments become the list memory.
//! - The blocking flavor ([`Sequence::sync`]) polls each handler future
//!   exactly once; a pending one fails with [`HandlerError::Suspended`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;

use crate::error::{HandlerError, RuntimeError};
use crate::runners::{Emission, Outcome, Runner};

/// Runs handlers in order with the same arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequence {
    blocking: bool,
}

impl Sequence {
    /// Async sequence: awaits each handler before calling the next.
    pub fn new() -> Self {
        Self { blocking: false }
    }

    /// Synchronous sequence: never suspends.
    pub fn sync() -> Self {
        Self { blocking: true }
    }

    /// Async sequence as a shared handle.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Returns true for the synchronous flavor.
    #[inline]
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }
}

#[async_trait]
impl Runner for Sequence {
    fn name(&self) -> &'static str {
        if self.blocking { "sequence_sync" } else { "sequence" }
    }

    async fn run(&self, emission: Emission) -> Result<Outcome, RuntimeError> {
        let mut results = Vec::new();
        let mut ran = false;

        for handler in emission.candidates() {
            let Some(fut) = emission.invoke(handler, emission.args().clone()) else {
                continue;
            };
            ran = true;

            let result = if self.blocking {
                fut.now_or_never().unwrap_or(Err(HandlerError::Suspended))
            } else {
                fut.await
            };

            match result.map_err(|e| emission.fail(e))? {
                None => {}
                Some(Value::Bool(false)) => return Ok(Outcome::Halted),
                Some(value) => results.push(value),
            }
        }

        emission.memoize(emission.args());
        if ran {
            Ok(Outcome::Completed(results))
        } else {
            Ok(Outcome::Completed(emission.args().clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::callbacks::{CallbackFn, CallbackRef, HandlerResult, Invocation, SyncCallbackFn};
    use crate::events::Emitter;

    fn returning(value: Option<Value>, calls: &Arc<AtomicUsize>) -> CallbackRef {
        let calls = Arc::clone(calls);
        SyncCallbackFn::arc("returning", move |_inv: Invocation| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(value.clone())
        })
    }

    #[tokio::test]
    async fn test_collects_defined_results() {
        let emitter = Emitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        emitter
            .on("on/x", returning(Some(json!("a")), &calls))
            .unwrap()
            .on("on/x", returning(None, &calls))
            .unwrap()
            .on("on/x", returning(Some(json!(3)), &calls))
            .unwrap();

        let out = emitter.emit("on/x", vec![json!("in")]).await.unwrap();
        assert_eq!(out, Outcome::Completed(vec![json!("a"), json!(3)]));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(emitter.peek("on/x"), Some(vec![json!("in")]));
    }

    #[tokio::test]
    async fn test_false_short_circuits() {
        let emitter = Emitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        emitter
            .on("on/x", returning(Some(json!(1)), &calls))
            .unwrap()
            .on("on/x", returning(Some(json!(false)), &calls))
            .unwrap()
            .on("on/x", returning(Some(json!(2)), &calls))
            .unwrap();

        let out = emitter.emit("on/x", vec![]).await.unwrap();
        assert!(out.is_halted());
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let out = emitter.emit_sync("on/x", vec![]).unwrap();
        assert!(out.is_halted());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_async_handlers_never_interleave() {
        let emitter = Emitter::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for (tag, delay) in [("slow", 30u64), ("fast", 0)] {
            let log = Arc::clone(&log);
            let cb: CallbackRef = CallbackFn::arc(tag, move |_inv: Invocation| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().push(format!("{tag}:begin"));
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    log.lock().push(format!("{tag}:end"));
                    Ok(None)
                }
            });
            emitter.on("on/x", cb).unwrap();
        }

        emitter.emit("on/x", vec![]).await.unwrap();
        assert_eq!(
            *log.lock(),
            vec!["slow:begin", "slow:end", "fast:begin", "fast:end"]
        );
    }

    #[tokio::test]
    async fn test_error_abandons_remaining_handlers() {
        let emitter = Emitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let failing: CallbackRef = CallbackFn::arc("failing", |_inv: Invocation| async {
            Err(HandlerError::fail("boom"))
        });
        emitter
            .on("on/x", failing)
            .unwrap()
            .on("on/x", returning(Some(json!(1)), &calls))
            .unwrap();

        let err = emitter.emit("on/x", vec![]).await.unwrap_err();
        assert_eq!(err.handler_error(), Some(&HandlerError::fail("boom")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(emitter.peek("on/x"), None);
    }

    #[tokio::test]
    async fn test_panics_become_handler_errors() {
        let emitter = Emitter::new();
        let eager: CallbackRef = SyncCallbackFn::arc("eager", |_inv: Invocation| -> HandlerResult { panic!("sync boom") });
        emitter.on("on/sync", eager).unwrap();
        let err = emitter.emit("on/sync", vec![]).await.unwrap_err();
        assert_eq!(err.handler_error().map(|e| e.as_label()), Some("handler_panicked"));

        let lazy: CallbackRef = CallbackFn::arc("lazy", |_inv: Invocation| async {
            if true {
                panic!("async boom");
            }
            Ok(None)
        });
        emitter.on("on/async", lazy).unwrap();
        let err = emitter.emit("on/async", vec![]).await.unwrap_err();
        assert_eq!(
            err.handler_error(),
            Some(&HandlerError::Panicked { info: "async boom".into() })
        );
    }

    #[test]
    fn test_sync_flavor_runs_without_runtime() {
        let emitter = Emitter::new();
        let calls = Arc::new(AtomicUsize::new(0));
        emitter.on("sig/setup", returning(Some(json!("ok")), &calls)).unwrap();

        let out = emitter.emit_sync("sig/setup", vec![]).unwrap();
        assert_eq!(out, Outcome::Completed(vec![json!("ok")]));
        assert_eq!(Sequence::sync().name(), "sequence_sync");
        assert!(Sequence::sync().is_blocking());
    }
}
