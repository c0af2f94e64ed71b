//! # sigvisor
//!
//! **Sigvisor** is a small event-emission and lifecycle signal engine.
//!
//! It provides typed emitters with pluggable runners, components driven by
//! lifecycle signals, and a pub/sub hub that remembers the last value of each
//! topic. The crate is designed as a building block for applications made of
//! loosely coupled parts that only talk through events.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Component   │   │  Component   │   │  Component   │
//!     │  (widget)    │   │  (store)     │   │  (logger)    │
//!     │  Emitter     │   │  Emitter     │   │  Emitter     │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ hub bindings     │                  │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Hub (shared Emitter, Executor runner, per-topic memory)          │
//! └───────────────────────────────────────────────────────────────────┘
//!
//!  Emitter ── HandlerList per event type ── Handler (callback, context, limit)
//!     │
//!     └─ emit(event, args) ─► Runner::run(Emission)
//!                               ├─ Sequence  (results collected, false halts)
//!                               ├─ Pipeline  (results become next args)
//!                               └─ Executor  (pipeline, phase-aware)
//! ```
//!
//! ### Lifecycle
//! ```text
//! absent ─► initialize ─► initialized ─► start ─► started
//!                                                   │
//! finalized ◄─ finalize ◄─ stopped ◄─ stop ◄────────┘
//!
//! sig/initialize: register in Registry, wire on/one/hub bindings
//! sig/start:      replay hub memory to `hub:memory/...` bindings
//! sig/finalize:   tear bindings down in reverse order, leave Registry
//! ```
//!
//! ## Features
//! | Area            | Description                                                | Key types / traits                      |
//! |-----------------|------------------------------------------------------------|-----------------------------------------|
//! | **Callbacks**   | Async or sync handler functions with an optional context.  | [`Callback`], [`CallbackFn`], [`SyncCallbackFn`] |
//! | **Events**      | Typed emitters, handler lists with generations and limits. | [`Emitter`], [`Handler`], [`Event`]     |
//! | **Runners**     | Pluggable dispatch strategies.                             | [`Runner`], [`Sequence`], [`Pipeline`], [`Executor`] |
//! | **Components**  | Lifecycle signals and declarative bindings.                | [`Component`], [`ComponentBuilder`], [`Phase`] |
//! | **Hub**         | Pub/sub with topic memory and replay.                      | [`Hub`]                                 |
//! | **Application** | Ordered start, reverse stop, grace period.                 | [`Application`], [`Config`]             |
//! | **Errors**      | Typed errors for calls and handler failures.               | [`RuntimeError`], [`HandlerError`]      |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a hub observer that forwards `log/<level>`
//!   publications to `tracing`, and attaches it to every [`Application`] hub.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use sigvisor::{Application, CallbackRef, Config, Invocation, SyncCallbackFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), sigvisor::RuntimeError> {
//!     let app = Application::builder(Config::default()).build();
//!
//!     let greet: CallbackRef = SyncCallbackFn::arc("greet", |inv: Invocation| {
//!         println!("hello, {}", inv.args[0]);
//!         Ok(None)
//!     });
//!     let greeter = app.component("greeter").hub_memory("user/name", greet).build()?;
//!
//!     app.hub().publish("user/name", vec![json!("ada")]).await?;
//!     app.start(vec![greeter]).await?; // replays "ada" on start
//!     app.stop().await?;
//!     Ok(())
//! }
//! ```
mod callbacks;
mod component;
mod core;
mod error;
mod events;
mod hub;
mod runners;

// ---- Public re-exports ----

pub use callbacks::{
    Args, BoxHandlerFuture, Callback, CallbackFn, CallbackRef, Context, ContextRef, Detached,
    HandlerResult, Invocation, SyncCallbackFn,
};
pub use component::{Binding, BindingKey, Component, ComponentBuilder, Feature, Group, Phase, signal};
pub use core::{Application, ApplicationBuilder, Config, Registry};
pub use error::{HandlerError, RuntimeError};
pub use events::{Emitter, EmitterId, Event, Handler, HandlerId, HandlerList, HandlerSpec, Iter};
pub use hub::Hub;
pub use runners::{Emission, Executor, Outcome, Pipeline, Runner, RunnerKind, RunnerRef, Sequence};

// Optional: expose the built-in hub log observer.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
mod observers;
#[cfg(feature = "logging")]
pub use observers::LogWriter;
