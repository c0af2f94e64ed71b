//! # Observers: built-in hub subscribers.
//!
//! Provided implementations:
//!   - [`LogWriter`] (enabled via `logging` feature) → forwards `log/<level>`
//!     publications to `tracing`
//!
//! ```text
//! hub.publish("log/info", ["window resized", 800, 600])
//!   └─► LogWriter handler ─► tracing::info!(target: "sigvisor::hub", ...)
//! ```

mod log;

pub use log::LogWriter;
