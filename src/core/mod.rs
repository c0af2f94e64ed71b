//! Application core: bootstrap and lifecycle orchestration.
//!
//! The public API from this module is [`Application`], which owns the shared
//! hub and registry, starts components in order and stops them in reverse
//! within a grace period.
//!
//! Internal modules:
//! - [`application`]: start/stop ordering, shutdown handling, grace timeout;
//! - [`builder`]: assembles an application from a [`Config`];
//! - [`config`]: runtime settings;
//! - [`registry`]: tracks initialized components;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod application;
mod builder;
mod config;
mod registry;
mod shutdown;

pub use application::Application;
pub use builder::ApplicationBuilder;
pub use config::Config;
pub use registry::Registry;
