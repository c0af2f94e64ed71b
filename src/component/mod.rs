//! # Components and their lifecycle.
//!
//! This module provides the lifecycle signal engine:
//! - [`Component`] - emitter owner with guarded `start`/`stop` transitions
//! - [`ComponentBuilder`] - explicit declaration of handlers and collaborators
//! - [`Phase`] - lifecycle phases
//! - [`BindingKey`] - parsed `<group>[:<feature>]/<type>` handler keys
//! - [`signal`] - the reserved `sig/*` event type names

mod binding;
mod builder;
#[allow(clippy::module_inception)]
mod component;
mod phase;
pub mod signal;

pub use binding::{Binding, BindingKey, Feature, Group};
pub use builder::ComponentBuilder;
pub use component::Component;
pub use phase::Phase;
