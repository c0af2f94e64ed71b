//! # Application: bootstraps components over a shared hub and registry.
//!
//! The [`Application`] owns the [`Hub`], the [`Registry`], and the runtime
//! configuration. It starts components in declaration order, waits for a
//! termination signal (or an explicit [`Application::shutdown`]), and then
//! stops them in reverse order within [`Config::grace`].
//!
//! ## High-level architecture
//! ```text
//! Application::run(components)
//!   ├─► start():  components[0].start() ─► components[1].start() ─► ...
//!   │               (sig/initialize + sig/start, registry register, hub wiring)
//!   │
//!   ├─► select!
//!   │     ├─ shutdown::wait_for_shutdown_signal()   (SIGINT/SIGTERM/SIGQUIT)
//!   │     └─ token.cancelled()                      (Application::shutdown)
//!   │
//!   └─► stop():   components[N-1].stop() ─► ... ─► components[0].stop()
//!                   └─ tokio::time::timeout(grace)
//!                        ├─ Ok      → Ok(())
//!                        └─ Elapsed → RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - A component that fails to start stays in whatever phase it reached; the
//!   ones started before it are kept and stopped by [`Application::stop`].
//! - `stop` only stops components that are `started`; the first failure is
//!   reported after every other component had its chance to stop.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use sigvisor::{Application, CallbackRef, Config, Invocation, Phase, SyncCallbackFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), sigvisor::RuntimeError> {
//!     let mut cfg = Config::default();
//!     cfg.grace = Duration::from_secs(5);
//!     let app = Application::builder(cfg).build();
//!
//!     let noop: CallbackRef = SyncCallbackFn::arc("noop", |_inv: Invocation| Ok(None));
//!     let widget = app.component("widget").sig("start", noop).build()?;
//!
//!     app.start(vec![widget.clone()]).await?;
//!     assert_eq!(widget.phase(), Phase::Started);
//!
//!     app.stop().await?;
//!     assert_eq!(widget.phase(), Phase::Finalized);
//!     Ok(())
//! }
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::component::{Component, ComponentBuilder, Phase};
use crate::core::{Config, Registry, builder::ApplicationBuilder, shutdown};
use crate::error::RuntimeError;
use crate::hub::Hub;

/// Orchestrates the lifecycle of a set of components.
pub struct Application {
    cfg: Config,
    hub: Hub,
    registry: Arc<Registry>,
    token: CancellationToken,
    started: Mutex<Vec<Arc<Component>>>,
}

impl Application {
    /// Creates a builder for an application with `cfg`.
    pub fn builder(cfg: Config) -> ApplicationBuilder {
        ApplicationBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, hub: Hub, registry: Arc<Registry>) -> Self {
        Self {
            cfg,
            hub,
            registry,
            token: CancellationToken::new(),
            started: Mutex::new(Vec::new()),
        }
    }

    /// Runtime configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Shared hub.
    #[inline]
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Shared registry.
    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Token cancelled by [`Application::shutdown`].
    pub fn shutdown_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Returns a component builder wired to this application's hub, registry
    /// and signal runner.
    pub fn component(&self, name: impl Into<Cow<'static, str>>) -> ComponentBuilder {
        Component::builder(name)
            .with_hub(self.hub.clone())
            .with_registry(Arc::clone(&self.registry))
            .with_signal_runner(self.cfg.signal_runner.runner())
    }

    /// Starts `components` in order.
    ///
    /// Stops at the first failure and returns it.
    pub async fn start(&self, components: Vec<Arc<Component>>) -> Result<(), RuntimeError> {
        for component in components {
            component.start().await?;
            debug!(component = %component.key(), "application started component");
            self.started.lock().push(component);
        }
        Ok(())
    }

    /// Stops every started component in reverse start order within the grace period.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let components: Vec<Arc<Component>> = std::mem::take(&mut *self.started.lock());
        let stopping = async {
            let mut first_err = None;
            for component in components.iter().rev() {
                if !component.phase().can_stop() {
                    continue;
                }
                if let Err(err) = component.stop().await {
                    warn!(component = %component.key(), error = %err, "stop failed");
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
            first_err.map_or(Ok(()), Err)
        };

        let Some(grace) = self.cfg.grace_limit() else {
            return stopping.await;
        };
        match tokio::time::timeout(grace, stopping).await {
            Ok(res) => res,
            Err(_) => {
                let stuck: Vec<String> = components
                    .iter()
                    .filter(|c| c.phase() != Phase::Finalized)
                    .map(|c| c.key())
                    .collect();
                warn!(?grace, ?stuck, "grace exceeded");
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Requests [`Application::run`] to stop its components.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Starts `components`, waits for a termination signal or
    /// [`Application::shutdown`], then stops them.
    pub async fn run(&self, components: Vec<Arc<Component>>) -> Result<(), RuntimeError> {
        if let Err(err) = self.start(components).await {
            if let Err(cleanup) = self.stop().await {
                warn!(error = %cleanup, "cleanup after failed start");
            }
            return Err(err);
        }
        info!("application running");
        self.drive_shutdown().await;
        info!("application stopping");
        self.stop().await
    }

    async fn drive_shutdown(&self) {
        tokio::select! {
            res = shutdown::wait_for_shutdown_signal() => {
                match res {
                    Ok(received) => info!(signal = %received, "termination signal received"),
                    Err(err) => {
                        warn!(error = %err, "signal handlers unavailable; waiting for shutdown()");
                        self.token.cancelled().await;
                    }
                }
            }
            _ = self.token.cancelled() => {
                debug!("shutdown requested");
            }
        }
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("cfg", &self.cfg)
            .field("hub", &self.hub)
            .field("started", &self.started.lock().len())
            .finish()
    }
}
