//! # Component: lifecycle signal engine.
//!
//! A [`Component`] owns an [`Emitter`] and drives it through the lifecycle
//! phases. Each transition is guarded, emits its signal through the signal
//! runner and only advances the phase once the whole chain has settled.
//!
//! ## Transitions
//! ```text
//! start():  guard absent|finalized
//!           phase=initialize  emit sig/initialize  phase=initialized
//!           phase=start       emit sig/start       phase=started
//! stop():   guard started
//!           phase=stop        emit sig/stop        phase=stopped
//!           phase=finalize    emit sig/finalize    phase=finalized
//! ```
//!
//! ## Built-in handlers
//! ```text
//! sig/initialize (first)  registry.register ─► sig/register ─► wire on/one/hub bindings
//! sig/start      (first)  republish hub:memory bindings
//! sig/finalize   (last)   tear down bindings in reverse ─► sig/unregister ─► registry.unregister
//!                          (a `sig/remove` veto does not apply to teardown)
//! ```
//!
//! ## Rules
//! - A handler failure aborts the transition; the phase keeps the last value
//!   assigned (a failed `start` leaves `initialize` or `start`).
//! - `on`/`one`/`off` announce themselves through the synchronous plumbing
//!   signals (`sig/setup`, `sig/add`, `sig/added`, `sig/remove`,
//!   `sig/removed`, `sig/teardown`); a halting `sig/setup`, `sig/add` or
//!   `sig/remove` handler vetoes the operation.

use std::borrow::Cow;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, trace};

use crate::callbacks::{Args, CallbackFn, CallbackRef, Context, ContextRef, HandlerResult, Invocation};
use crate::component::binding::{Binding, Group};
use crate::component::builder::ComponentBuilder;
use crate::component::phase::Phase;
use crate::component::signal;
use crate::core::Registry;
use crate::error::{HandlerError, RuntimeError};
use crate::events::{Emitter, Event, Handler, HandlerSpec};
use crate::hub::Hub;
use crate::runners::{Outcome, RunnerRef};

/// Global sequence for component identifiers.
static COMPONENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// A subscription made while wiring, undone on finalize.
enum Wired {
    Local { ty: String, callback: CallbackRef },
    Hub { topic: String, callback: CallbackRef },
}

/// Component with a guarded lifecycle.
///
/// # Example
/// ```rust
/// use serde_json::json;
/// use sigvisor::{Component, Invocation, Phase, SyncCallbackFn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), sigvisor::RuntimeError> {
/// let foo = Component::builder("foo")
///     .sig("start", SyncCallbackFn::arc("hello", |_inv: Invocation| Ok(Some(json!("hello")))))
///     .build()?;
///
/// assert_eq!(foo.phase(), Phase::Absent);
/// let results = foo.start().await?;
/// assert_eq!(results, vec![json!("hello")]);
/// assert_eq!(foo.phase(), Phase::Started);
///
/// foo.stop().await?;
/// assert_eq!(foo.phase(), Phase::Finalized);
/// # Ok(())
/// # }
/// ```
pub struct Component {
    id: u64,
    name: Cow<'static, str>,
    phase: Mutex<Phase>,
    emitter: Emitter,
    hub: Option<Hub>,
    registry: Option<Arc<Registry>>,
    bindings: Vec<Binding>,
    wired: Mutex<Vec<Wired>>,
}

impl Component {
    /// Starts declaring a component named `name`.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> ComponentBuilder {
        ComponentBuilder::new(name)
    }

    pub(crate) fn create(
        name: Cow<'static, str>,
        signal_runner: RunnerRef,
        hub: Option<Hub>,
        registry: Option<Arc<Registry>>,
        bindings: Vec<Binding>,
    ) -> Result<Arc<Self>, RuntimeError> {
        let component = Arc::new_cyclic(|this: &Weak<Component>| {
            let owner: Weak<dyn Context> = this.clone();
            Component {
                id: COMPONENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
                name,
                phase: Mutex::new(Phase::Absent),
                emitter: Emitter::owned_by(owner, signal_runner),
                hub,
                registry,
                bindings,
                wired: Mutex::new(Vec::new()),
            }
        });
        component.install()?;
        Ok(component)
    }

    /// Registers the built-in handlers around the declared signal handlers.
    fn install(self: &Arc<Self>) -> Result<(), RuntimeError> {
        let this = Arc::downgrade(self);
        self.emitter.add(
            signal::INITIALIZE,
            HandlerSpec::new(step("component:initialize", this.clone(), |me| async move {
                me.on_initialize().await
            })),
        )?;
        self.emitter.add(
            signal::START,
            HandlerSpec::new(step("component:start", this.clone(), |me| async move {
                me.on_start().await
            })),
        )?;
        for binding in self.bindings.iter().filter(|b| b.key().group() == Group::Sig) {
            self.emitter
                .add(&binding.key().event_type(), HandlerSpec::new(Arc::clone(binding.callback())))?;
        }
        self.emitter.add(
            signal::FINALIZE,
            HandlerSpec::new(step("component:finalize", this, |me| async move {
                me.on_finalize().await
            })),
        )?;
        Ok(())
    }

    /// Unique identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Component name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry key: `name@id`.
    pub fn key(&self) -> String {
        format!("{}@{}", self.name, self.id)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.lock()
    }

    /// Own emitter.
    #[inline]
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Hub this component subscribes to, if any.
    #[inline]
    pub fn hub(&self) -> Option<&Hub> {
        self.hub.as_ref()
    }

    /// Declared bindings.
    #[inline]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Starts the component with no arguments.
    pub async fn start(&self) -> Result<Args, RuntimeError> {
        self.start_with(Vec::new()).await
    }

    /// Runs `sig/initialize` then `sig/start` with `args`.
    ///
    /// Resolves to the concatenated results of both signals.
    /// Fails with [`RuntimeError::InvalidTransition`] unless the phase is
    /// `absent` or `finalized`.
    pub async fn start_with(&self, args: Args) -> Result<Args, RuntimeError> {
        self.transition("start", Phase::can_start, Phase::Initialize)?;
        let mut results = self.emitter.emit(signal::INITIALIZE, args.clone()).await?.into_values();
        self.set_phase(Phase::Initialized);

        self.set_phase(Phase::Start);
        results.extend(self.emitter.emit(signal::START, args).await?.into_values());
        self.set_phase(Phase::Started);

        debug!(component = %self.key(), "started");
        Ok(results)
    }

    /// Stops the component with no arguments.
    pub async fn stop(&self) -> Result<Args, RuntimeError> {
        self.stop_with(Vec::new()).await
    }

    /// Runs `sig/stop` then `sig/finalize` with `args`.
    ///
    /// Fails with [`RuntimeError::InvalidTransition`] unless the phase is `started`.
    pub async fn stop_with(&self, args: Args) -> Result<Args, RuntimeError> {
        self.transition("stop", Phase::can_stop, Phase::Stop)?;
        let mut results = self.emitter.emit(signal::STOP, args.clone()).await?.into_values();
        self.set_phase(Phase::Stopped);

        self.set_phase(Phase::Finalize);
        results.extend(self.emitter.emit(signal::FINALIZE, args).await?.into_values());
        self.set_phase(Phase::Finalized);

        debug!(component = %self.key(), "finalized");
        Ok(results)
    }

    /// Emits signal `name` (`"start"` or `"sig/start"`) through the signal runner.
    pub async fn signal(&self, name: &str, args: Args) -> Result<Outcome, RuntimeError> {
        let ty = signal::signal_type(name);
        if ty.len() == signal::PREFIX.len() {
            return Err(RuntimeError::invalid_argument("signal name must not be empty"));
        }
        self.emitter.emit(ty, args).await
    }

    /// Emits an event on the component's own emitter.
    pub async fn emit(&self, event: impl Into<Event>, args: Args) -> Result<Outcome, RuntimeError> {
        self.emitter.emit(event, args).await
    }

    /// Adds a local handler, announcing it through the plumbing signals.
    ///
    /// Returns `None` when a `sig/setup` or `sig/add` handler vetoed it.
    pub fn on(&self, ty: &str, spec: impl Into<HandlerSpec>) -> Result<Option<Arc<Handler>>, RuntimeError> {
        self.add_local(ty, spec.into())
    }

    /// Adds a local handler that runs at most once.
    ///
    /// The runner unlinks the handler when it claims its last invocation;
    /// that unlink is not announced through `sig/removed` or `sig/teardown`.
    pub fn one(&self, ty: &str, spec: impl Into<HandlerSpec>) -> Result<Option<Arc<Handler>>, RuntimeError> {
        self.add_local(ty, spec.into().with_limit(1))
    }

    /// Removes local handlers, announcing it through the plumbing signals.
    ///
    /// Returns the removed handlers; empty when nothing matched or a
    /// `sig/remove` handler vetoed the removal.
    pub fn off(
        &self,
        ty: &str,
        context: Option<&ContextRef>,
        callback: Option<&CallbackRef>,
    ) -> Result<Vec<Arc<Handler>>, RuntimeError> {
        if self.plumb(signal::REMOVE, vec![json!(ty)])?.is_halted() {
            trace!(component = %self.key(), ty, "remove vetoed");
            return Ok(Vec::new());
        }
        self.detach(ty, context, callback)
    }

    /// Unlinks matching local handlers without consulting `sig/remove`, then
    /// announces `sig/removed` and, when the type has no handler left,
    /// `sig/teardown`.
    fn detach(
        &self,
        ty: &str,
        context: Option<&ContextRef>,
        callback: Option<&CallbackRef>,
    ) -> Result<Vec<Arc<Handler>>, RuntimeError> {
        let removed = self.emitter.off(ty, context, callback);
        self.plumb(signal::REMOVED, vec![json!(ty), json!(removed.len())])?;
        if !removed.is_empty() && !self.emitter.has_handlers(ty) {
            self.plumb(signal::TEARDOWN, vec![json!(ty)])?;
        }
        Ok(removed)
    }

    /// Announces `task` through `sig/task`, then awaits it.
    pub async fn task<T, F>(&self, name: &str, task: F) -> Result<T, RuntimeError>
    where
        F: Future<Output = Result<T, HandlerError>> + Send,
    {
        self.emitter.emit(signal::TASK, vec![json!(name)]).await?;
        task.await.map_err(|source| RuntimeError::Handler {
            ty: signal::TASK.to_string(),
            source,
        })
    }

    fn add_local(&self, ty: &str, spec: HandlerSpec) -> Result<Option<Arc<Handler>>, RuntimeError> {
        if ty.is_empty() {
            return Err(RuntimeError::invalid_argument("event type must not be empty"));
        }
        if !self.emitter.has_handlers(ty) && self.plumb(signal::SETUP, vec![json!(ty)])?.is_halted() {
            trace!(component = %self.key(), ty, "setup vetoed");
            return Ok(None);
        }
        if self.plumb(signal::ADD, vec![json!(ty), json!(spec.limit())])?.is_halted() {
            trace!(component = %self.key(), ty, "add vetoed");
            return Ok(None);
        }
        let handler = self.emitter.add(ty, spec)?;
        self.plumb(signal::ADDED, vec![json!(ty), json!(handler.id().to_string())])?;
        Ok(Some(handler))
    }

    fn plumb(&self, signal: &str, args: Args) -> Result<Outcome, RuntimeError> {
        self.emitter.emit_sync(signal, args)
    }

    fn transition(&self, action: &'static str, allowed: fn(Phase) -> bool, next: Phase) -> Result<(), RuntimeError> {
        let mut phase = self.phase.lock();
        if !allowed(*phase) {
            return Err(RuntimeError::InvalidTransition { action, phase: *phase });
        }
        trace!(component = %self.key(), from = %*phase, to = %next, "phase");
        *phase = next;
        Ok(())
    }

    fn set_phase(&self, next: Phase) {
        let mut phase = self.phase.lock();
        trace!(component = %self.key(), from = %*phase, to = %next, "phase");
        *phase = next;
    }

    fn context(self: &Arc<Self>) -> ContextRef {
        Arc::clone(self) as ContextRef
    }

    async fn on_initialize(self: Arc<Self>) -> Result<(), RuntimeError> {
        if let Some(registry) = &self.registry {
            registry.register(&self).await;
        }
        self.emitter.emit(signal::REGISTER, vec![json!(self.key())]).await?;
        self.wire()
    }

    /// Subscribes the `on`/`one`/`hub` bindings in declaration order.
    fn wire(self: &Arc<Self>) -> Result<(), RuntimeError> {
        let ctx = self.context();
        for binding in &self.bindings {
            let key = binding.key();
            let callback = Arc::clone(binding.callback());
            let wired = match key.group() {
                Group::Sig => continue,
                Group::On | Group::One => {
                    let ty = key.event_type();
                    let spec = HandlerSpec::new(Arc::clone(&callback));
                    let added = if key.group() == Group::One {
                        self.one(&ty, spec)?
                    } else {
                        self.on(&ty, spec)?
                    };
                    match added {
                        Some(_) => Wired::Local { ty, callback },
                        None => continue,
                    }
                }
                Group::Hub => {
                    let Some(hub) = &self.hub else { continue };
                    let spec = HandlerSpec::new(Arc::clone(&callback)).with_context(Arc::clone(&ctx));
                    hub.subscribe(key.ty(), spec)?;
                    Wired::Hub {
                        topic: key.ty().to_string(),
                        callback,
                    }
                }
            };
            trace!(component = %self.key(), binding = %key, "wired");
            self.wired.lock().push(wired);
        }
        Ok(())
    }

    /// Replays the memory of `hub:memory/*` topics to this component.
    async fn on_start(self: Arc<Self>) -> Result<(), RuntimeError> {
        let Some(hub) = &self.hub else { return Ok(()) };
        let ctx = self.context();
        for binding in self.bindings.iter().filter(|b| b.key().is_memory()) {
            hub.republish(
                binding.key().ty(),
                Some(Arc::clone(&ctx)),
                Some(Arc::clone(binding.callback())),
            )
            .await?;
        }
        Ok(())
    }

    async fn on_finalize(self: Arc<Self>) -> Result<(), RuntimeError> {
        let wired = std::mem::take(&mut *self.wired.lock());
        let ctx = self.context();
        for entry in wired.into_iter().rev() {
            match entry {
                Wired::Local { ty, callback } => {
                    self.detach(&ty, Some(&ctx), Some(&callback))?;
                }
                Wired::Hub { topic, callback } => {
                    if let Some(hub) = &self.hub {
                        hub.unsubscribe(&topic, Some(&ctx), Some(&callback));
                    }
                }
            }
        }
        self.emitter.emit(signal::UNREGISTER, vec![json!(self.key())]).await?;
        if let Some(registry) = &self.registry {
            registry.unregister(&self.key()).await;
        }
        Ok(())
    }
}

/// Wraps a built-in lifecycle step as a callback holding the component weakly.
fn step<F, Fut>(name: &'static str, this: Weak<Component>, f: F) -> CallbackRef
where
    F: Fn(Arc<Component>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RuntimeError>> + Send + 'static,
{
    CallbackFn::arc(name, move |_inv: Invocation| {
        let pending = this.upgrade().map(&f);
        async move {
            let result: HandlerResult = match pending {
                Some(fut) => fut.await.map(|()| None).map_err(RuntimeError::into_handler_error),
                None => Ok(None),
            };
            result
        }
    })
}

impl Context for Component {
    fn phase(&self) -> Option<Phase> {
        Some(Component::phase(self))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Component")
            .field("key", &self.key())
            .field("phase", &self.phase())
            .field("bindings", &self.bindings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{Value, json};

    use super::*;
    use crate::callbacks::SyncCallbackFn;
    use crate::runners::RunnerKind;

    type Log = Arc<Mutex<Vec<String>>>;

    fn new_log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn recorder(log: &Log, tag: &'static str) -> CallbackRef {
        let log = Arc::clone(log);
        SyncCallbackFn::arc(tag, move |inv: Invocation| {
            let args: Vec<String> = inv.args.iter().map(Value::to_string).collect();
            log.lock().push(format!("{tag}({})", args.join(",")));
            Ok(None)
        })
    }

    fn returning(value: Value) -> CallbackRef {
        SyncCallbackFn::arc("returning", move |_inv: Invocation| Ok(Some(value.clone())))
    }

    #[tokio::test]
    async fn test_lifecycle_guards() {
        let c = Component::builder("guarded").build().unwrap();
        assert_eq!(c.phase(), Phase::Absent);

        c.start().await.unwrap();
        assert_eq!(c.phase(), Phase::Started);

        let err = c.start().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidTransition { action: "start", phase: Phase::Started }
        ));

        c.stop().await.unwrap();
        assert_eq!(c.phase(), Phase::Finalized);

        let err = c.stop().await.unwrap_err();
        assert_eq!(err.to_string(), "cannot stop from phase finalized");

        // finalized components may start again
        c.start().await.unwrap();
        assert_eq!(c.phase(), Phase::Started);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_rejected() {
        let c = Component::builder("fresh").build().unwrap();
        let err = c.stop().await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_transition");
        assert_eq!(c.phase(), Phase::Absent);
    }

    #[tokio::test]
    async fn test_start_waits_for_both_signals_in_order() {
        let log = new_log();
        let slow = {
            let log = Arc::clone(&log);
            CallbackFn::arc("fn", move |_inv: Invocation| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().push("fn:begin".into());
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    log.lock().push("fn:end".into());
                    Ok(Some(json!("initialized")))
                }
            })
        };
        let fast = {
            let log = Arc::clone(&log);
            CallbackFn::arc("fn2", move |_inv: Invocation| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().push("fn2:begin".into());
                    tokio::task::yield_now().await;
                    log.lock().push("fn2:end".into());
                    Ok(Some(json!("started")))
                }
            })
        };
        let foo = Component::builder("Foo")
            .sig("initialize", slow)
            .sig("start", fast)
            .build()
            .unwrap();

        let results = foo.start().await.unwrap();
        assert_eq!(*log.lock(), vec!["fn:begin", "fn:end", "fn2:begin", "fn2:end"]);
        assert_eq!(results, vec![json!("initialized"), json!("started")]);
    }

    #[tokio::test]
    async fn test_failed_start_leaves_intermediate_phase() {
        let failing: CallbackRef = CallbackFn::arc("failing", |_inv: Invocation| async {
            Err(HandlerError::fail("no config"))
        });
        let log = new_log();
        let c = Component::builder("broken")
            .sig("start", failing)
            .sig("start", recorder(&log, "after"))
            .build()
            .unwrap();

        let err = c.start().await.unwrap_err();
        assert_eq!(err.handler_error(), Some(&HandlerError::fail("no config")));
        assert_eq!(c.phase(), Phase::Start);
        assert!(log.lock().is_empty());

        let err = c.start().await.unwrap_err();
        assert!(matches!(err, RuntimeError::InvalidTransition { phase: Phase::Start, .. }));
    }

    #[tokio::test]
    async fn test_registry_membership_follows_lifecycle() {
        let registry = Registry::new();
        let log = new_log();
        let c = Component::builder("member")
            .with_registry(Arc::clone(&registry))
            .sig("register", recorder(&log, "register"))
            .sig("unregister", recorder(&log, "unregister"))
            .build()
            .unwrap();

        assert!(registry.is_empty().await);
        c.start().await.unwrap();
        assert_eq!(registry.list().await, vec![c.key()]);

        c.stop().await.unwrap();
        assert!(registry.is_empty().await);
        let key = json!(c.key()).to_string();
        assert_eq!(
            *log.lock(),
            vec![format!("register({key})"), format!("unregister({key})")]
        );
    }

    #[tokio::test]
    async fn test_bindings_are_wired_and_torn_down() {
        let hub = Hub::new();
        let log = new_log();
        let c = Component::builder("widget")
            .with_hub(hub.clone())
            .on("resize", recorder(&log, "resize"))
            .one("ready", recorder(&log, "ready"))
            .hub("window/size", recorder(&log, "size"))
            .build()
            .unwrap();

        assert!(!c.emitter().has_handlers("on/resize"));
        assert!(!hub.emitter().has_handlers("window/size"));

        c.start().await.unwrap();
        c.emit("on/resize", vec![json!(1)]).await.unwrap();
        c.emit("on/ready", vec![]).await.unwrap();
        c.emit("on/ready", vec![]).await.unwrap();
        hub.publish("window/size", vec![json!(800)]).await.unwrap();
        assert_eq!(*log.lock(), vec!["resize(1)", "ready()", "size(800)"]);

        c.stop().await.unwrap();
        assert!(!c.emitter().has_handlers("on/resize"));
        assert!(!hub.emitter().has_handlers("window/size"));

        hub.publish("window/size", vec![json!(640)]).await.unwrap();
        assert_eq!(log.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_hub_memory_is_replayed_on_start() {
        let hub = Hub::new();
        let log = new_log();
        hub.publish("user", vec![json!("ann")]).await.unwrap();

        let c = Component::builder("profile")
            .with_hub(hub.clone())
            .hub_memory("user", recorder(&log, "memory"))
            .hub("user", recorder(&log, "live"))
            .build()
            .unwrap();
        c.start().await.unwrap();
        assert_eq!(*log.lock(), vec![r#"memory("ann")"#]);

        hub.publish("user", vec![json!("bob")]).await.unwrap();
        assert_eq!(
            *log.lock(),
            vec![r#"memory("ann")"#, r#"memory("bob")"#, r#"live("bob")"#]
        );
    }

    #[tokio::test]
    async fn test_initializing_component_misses_live_publication() {
        let hub = Hub::new();
        let log = new_log();
        let publisher: CallbackRef = {
            let hub = hub.clone();
            CallbackFn::arc("publisher", move |_inv: Invocation| {
                let hub = hub.clone();
                async move {
                    let published = hub.publish("status", vec![json!("booting")]).await;
                    let result: HandlerResult = published
                        .map(|_| None)
                        .map_err(RuntimeError::into_handler_error);
                    result
                }
            })
        };
        let c = Component::builder("self-aware")
            .with_hub(hub.clone())
            .hub_memory("status", recorder(&log, "status"))
            .sig("initialize", publisher)
            .build()
            .unwrap();

        c.start().await.unwrap();
        // skipped while initializing, then delivered from memory on start
        assert_eq!(*log.lock(), vec![r#"status("booting")"#]);
    }

    #[tokio::test]
    async fn test_plumbing_signals_and_veto() {
        let log = new_log();
        let c = Component::builder("plumbed")
            .sig("setup", recorder(&log, "setup"))
            .sig("added", recorder(&log, "added"))
            .sig("removed", recorder(&log, "removed"))
            .sig("teardown", recorder(&log, "teardown"))
            .build()
            .unwrap();

        let cb = recorder(&log, "cb");
        let handler = c.on("on/x", &cb).unwrap().unwrap();
        c.on("on/x", &cb).unwrap();
        assert_eq!(c.off("on/x", None, Some(&cb)).unwrap().len(), 2);

        let id = json!(handler.id().to_string()).to_string();
        let entries = log.lock().clone();
        assert_eq!(entries[0], r#"setup("on/x")"#);
        assert_eq!(entries[1], format!(r#"added("on/x",{id})"#));
        assert!(entries[2].starts_with("added("));
        assert_eq!(entries[3], r#"removed("on/x",2)"#);
        assert_eq!(entries[4], r#"teardown("on/x")"#);
        assert_eq!(entries.len(), 5);

        c.on("sig/add", returning(json!(false))).unwrap();
        assert!(c.on("on/y", &cb).unwrap().is_none());
        assert!(!c.emitter().has_handlers("on/y"));
    }

    #[tokio::test]
    async fn test_remove_veto_keeps_handlers() {
        let c = Component::builder("sticky")
            .sig("remove", returning(json!(false)))
            .build()
            .unwrap();
        let log = new_log();
        c.on("on/x", recorder(&log, "cb")).unwrap();
        assert!(c.off("on/x", None, None).unwrap().is_empty());
        assert!(c.emitter().has_handlers("on/x"));
    }

    #[tokio::test]
    async fn test_signal_and_task() {
        let log = new_log();
        let c = Component::builder("worker")
            .sig("custom", recorder(&log, "custom"))
            .sig("task", recorder(&log, "task"))
            .build()
            .unwrap();

        c.signal("custom", vec![json!(1)]).await.unwrap();
        c.signal("sig/custom", vec![json!(2)]).await.unwrap();
        let err = c.signal("", vec![]).await.unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_argument");

        let value = c.task("load", async { Ok::<_, HandlerError>(5) }).await.unwrap();
        assert_eq!(value, 5);
        let err = c
            .task("fail", async { Err::<(), _>(HandlerError::fail("nope")) })
            .await
            .unwrap_err();
        assert_eq!(err.handler_error(), Some(&HandlerError::fail("nope")));

        assert_eq!(
            *log.lock(),
            vec!["custom(1)", "custom(2)", r#"task("load")"#, r#"task("fail")"#]
        );
    }

    #[test]
    fn test_builder_rejects_hub_binding_without_hub() {
        let log = new_log();
        let err = Component::builder("lonely")
            .hub("topic", recorder(&log, "t"))
            .build()
            .unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_argument");

        let err = Component::builder("typo")
            .bind("no/such", recorder(&log, "t"))
            .build()
            .unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_argument");
    }

    #[tokio::test]
    async fn test_component_is_default_context_of_its_handlers() {
        let c = Component::builder("ctx").build().unwrap();
        let seen = Arc::new(Mutex::new(None));
        let probe: CallbackRef = {
            let seen = Arc::clone(&seen);
            SyncCallbackFn::arc("probe", move |inv: Invocation| {
                *seen.lock() = inv.context.and_then(|ctx| ctx.phase());
                Ok(None)
            })
        };
        c.on("on/probe", probe).unwrap();
        c.start().await.unwrap();
        c.emit("on/probe", vec![]).await.unwrap();
        assert_eq!(*seen.lock(), Some(Phase::Started));
    }

    #[tokio::test]
    async fn test_lifecycle_side_effects_under_each_signal_runner() {
        for kind in [RunnerKind::Sequence, RunnerKind::SyncSequence, RunnerKind::Pipeline] {
            let hub = Hub::new();
            let registry = Registry::new();
            let log = new_log();
            let c = Component::builder("runner")
                .with_hub(hub.clone())
                .with_registry(Arc::clone(&registry))
                .with_signal_runner(kind.runner())
                .on("ping", recorder(&log, "ping"))
                .hub("topic", recorder(&log, "topic"))
                .build()
                .unwrap();

            c.start().await.unwrap();
            assert_eq!(registry.list().await, vec![c.key()], "{}", kind.as_str());
            c.emit("on/ping", vec![]).await.unwrap();
            hub.publish("topic", vec![json!(1)]).await.unwrap();
            assert_eq!(*log.lock(), vec!["ping()", "topic(1)"], "{}", kind.as_str());

            c.stop().await.unwrap();
            assert!(registry.is_empty().await, "{}", kind.as_str());
            assert!(!c.emitter().has_handlers("on/ping"));
            assert!(!hub.emitter().has_handlers("topic"));
        }

        let err = Component::builder("phased")
            .with_signal_runner(RunnerKind::Executor.runner())
            .build()
            .unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_argument");
    }

    #[tokio::test]
    async fn test_remove_veto_does_not_block_teardown() {
        let log = new_log();
        let c = Component::builder("restartable")
            .sig("remove", returning(json!(false)))
            .sig("removed", recorder(&log, "removed"))
            .on("x", recorder(&log, "x"))
            .build()
            .unwrap();

        c.start().await.unwrap();
        c.stop().await.unwrap();
        assert!(!c.emitter().has_handlers("on/x"));
        assert_eq!(*log.lock(), vec![r#"removed("on/x",1)"#]);

        log.lock().clear();
        c.start().await.unwrap();
        c.emit("on/x", vec![]).await.unwrap();
        assert_eq!(*log.lock(), vec!["x()"]);
    }

    #[tokio::test]
    async fn test_exhausted_one_handler_is_unlinked_silently() {
        let log = new_log();
        let c = Component::builder("once")
            .sig("removed", recorder(&log, "removed"))
            .sig("teardown", recorder(&log, "teardown"))
            .build()
            .unwrap();
        c.one("on/x", recorder(&log, "x")).unwrap();

        c.emit("on/x", vec![]).await.unwrap();
        c.emit("on/x", vec![]).await.unwrap();
        assert!(!c.emitter().has_handlers("on/x"));
        assert_eq!(*log.lock(), vec!["x()"]);
    }
}
