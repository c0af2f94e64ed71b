use std::borrow::Cow;
use std::sync::Arc;

use crate::callbacks::CallbackRef;
use crate::component::binding::{Binding, BindingKey, Feature, Group};
use crate::component::component::Component;
use crate::core::Registry;
use crate::error::RuntimeError;
use crate::hub::Hub;
use crate::runners::{RunnerRef, Sequence};

/// Builder declaring a component's handlers and collaborators.
///
/// Handlers are listed explicitly, in the order they should run. Signal
/// handlers (`sig`) are registered when the component is built; `on`, `one`
/// and hub bindings are wired on `sig/initialize` and torn down in reverse
/// order on `sig/finalize`.
///
/// ## Example
/// ```rust
/// use sigvisor::{CallbackRef, Component, Hub, Invocation, SyncCallbackFn};
///
/// let noop: CallbackRef = SyncCallbackFn::arc("noop", |_inv: Invocation| Ok(None));
/// let widget = Component::builder("widget")
///     .with_hub(Hub::new())
///     .sig("start", noop.clone())
///     .on("resize", noop.clone())
///     .hub_memory("window/size", noop.clone())
///     .bind("one/ready", noop)
///     .build()
///     .unwrap();
/// assert_eq!(widget.bindings().len(), 4);
/// ```
pub struct ComponentBuilder {
    name: Cow<'static, str>,
    hub: Option<Hub>,
    registry: Option<Arc<Registry>>,
    signal_runner: RunnerRef,
    bindings: Vec<Binding>,
    error: Option<RuntimeError>,
}

impl ComponentBuilder {
    /// Creates a builder with the async [`Sequence`] as signal runner.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            hub: None,
            registry: None,
            signal_runner: Sequence::arc(),
            bindings: Vec::new(),
            error: None,
        }
    }

    /// Sets the hub used by hub bindings.
    pub fn with_hub(mut self, hub: Hub) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Sets the registry the component joins while initialized.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Overrides the runner used for the component's own emissions.
    ///
    /// A phase-filtering runner such as [`Executor`](crate::Executor) is
    /// rejected by [`ComponentBuilder::build`]: the component is in a protected
    /// phase while its `sig/initialize` and `sig/finalize` handlers run.
    pub fn with_signal_runner(mut self, runner: RunnerRef) -> Self {
        self.signal_runner = runner;
        self
    }

    /// Handles signal `name` (`"start"` handles `sig/start`).
    pub fn sig(self, name: &str, callback: CallbackRef) -> Self {
        self.push(Group::Sig, None, name, callback)
    }

    /// Handles local event `on/<ty>`.
    pub fn on(self, ty: &str, callback: CallbackRef) -> Self {
        self.push(Group::On, None, ty, callback)
    }

    /// Handles local event `on/<ty>` once.
    pub fn one(self, ty: &str, callback: CallbackRef) -> Self {
        self.push(Group::One, None, ty, callback)
    }

    /// Subscribes to hub `topic`.
    pub fn hub(self, topic: &str, callback: CallbackRef) -> Self {
        self.push(Group::Hub, None, topic, callback)
    }

    /// Subscribes to hub `topic` and replays its memory on start.
    pub fn hub_memory(self, topic: &str, callback: CallbackRef) -> Self {
        self.push(Group::Hub, Some(Feature::Memory), topic, callback)
    }

    /// Declares a binding from a `<group>[:<feature>]/<type>` key.
    ///
    /// A malformed key is reported by [`ComponentBuilder::build`].
    pub fn bind(mut self, key: &str, callback: CallbackRef) -> Self {
        match key.parse::<BindingKey>() {
            Ok(key) => self.bindings.push(Binding::new(key, callback)),
            Err(err) => self.fail(err),
        }
        self
    }

    fn push(mut self, group: Group, feature: Option<Feature>, ty: &str, callback: CallbackRef) -> Self {
        let ty = match group {
            Group::Sig => ty.strip_prefix("sig/").unwrap_or(ty),
            _ => ty,
        };
        match BindingKey::new(group, feature, ty) {
            Ok(key) => self.bindings.push(Binding::new(key, callback)),
            Err(err) => self.fail(err),
        }
        self
    }

    fn fail(&mut self, err: RuntimeError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Builds the component.
    ///
    /// Fails with [`RuntimeError::InvalidArgument`] on the first malformed
    /// binding, when hub bindings were declared without a hub, or when the
    /// signal runner filters handlers by phase.
    pub fn build(self) -> Result<Arc<Component>, RuntimeError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.signal_runner.filters_by_phase() {
            return Err(RuntimeError::invalid_argument(format!(
                "component {} cannot use the {} runner for its signals",
                self.name,
                self.signal_runner.name()
            )));
        }
        if self.hub.is_none() {
            if let Some(binding) = self.bindings.iter().find(|b| b.key().group() == Group::Hub) {
                return Err(RuntimeError::invalid_argument(format!(
                    "component {} declares {} without a hub",
                    self.name,
                    binding.key()
                )));
            }
        }
        Component::create(self.name, self.signal_runner, self.hub, self.registry, self.bindings)
    }
}

impl std::fmt::Debug for ComponentBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBuilder")
            .field("name", &self.name)
            .field("signal_runner", &self.signal_runner.name())
            .field("bindings", &self.bindings)
            .finish()
    }
}
