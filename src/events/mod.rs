//! Events: handlers, per-type handler lists and the emitter.
//!
//! This module groups the handler **data model** and the **emitter** that
//! registers handlers and hands emissions over to a runner.
//!
//! ## Contents
//! - [`Event`] event descriptor (type, runner override, scope/callback filters)
//! - [`Handler`], [`HandlerSpec`] one registered listener and its registration request
//! - [`HandlerList`] per-type linked list with memory and generation counter
//! - [`Emitter`] `on` / `one` / `off` / `emit` / `emit_sync` / `reemit`
//!
//! ## Quick reference
//! - **Owners**: every [`Component`](crate::Component) owns one emitter; the
//!   [`Hub`](crate::Hub) wraps a shared one.
//! - **Execution**: see `runners/mod.rs` for the strategies an emission runs under.

pub(crate) mod emitter;
pub(crate) mod event;
pub(crate) mod handler;
pub(crate) mod list;

pub use emitter::{Emitter, EmitterId};
pub use event::Event;
pub use handler::{Handler, HandlerId, HandlerSpec};
pub use list::{HandlerList, Iter};

pub(crate) use emitter::ListRef;
