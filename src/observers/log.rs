//! # LogWriter: forwards hub log topics to `tracing`.
//!
//! Subscribes to `log/trace`, `log/debug`, `log/info`, `log/warn` and
//! `log/error`. The first argument is the message; the remaining ones are
//! recorded as a JSON `fields` value.
//!
//! ## Example output
//! ```text
//! INFO sigvisor::hub: window resized fields=[800,600]
//! WARN sigvisor::hub: cache miss fields=[]
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value;

use crate::callbacks::{CallbackRef, Invocation, SyncCallbackFn};
use crate::error::RuntimeError;
use crate::events::Handler;
use crate::hub::Hub;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Hub observer writing `log/<level>` publications through `tracing`.
#[derive(Debug, Clone)]
pub struct LogWriter {
    prefix: Cow<'static, str>,
}

impl LogWriter {
    /// Construct a [`LogWriter`] listening on `log/<level>`.
    #[must_use]
    pub fn new() -> Self {
        Self { prefix: Cow::Borrowed("log") }
    }

    /// Listens on `<prefix>/<level>` instead.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<Cow<'static, str>>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Topic for `level`.
    pub fn topic(&self, level: &str) -> String {
        format!("{}/{level}", self.prefix)
    }

    /// Subscribes one handler per level; returns them in level order.
    pub fn attach(&self, hub: &Hub) -> Result<Vec<Arc<Handler>>, RuntimeError> {
        LEVELS
            .iter()
            .map(|&level| {
                let callback: CallbackRef = SyncCallbackFn::arc(level, move |inv: Invocation| {
                    write(level, &inv.args);
                    Ok(None)
                });
                hub.subscribe(&self.topic(level), callback)
            })
            .collect()
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn write(level: &str, args: &[Value]) {
    let message = match args.first() {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let fields = Value::from(args.get(1..).unwrap_or_default().to_vec());
    match level {
        "trace" => tracing::trace!(target: "sigvisor::hub", %fields, "{message}"),
        "debug" => tracing::debug!(target: "sigvisor::hub", %fields, "{message}"),
        "info" => tracing::info!(target: "sigvisor::hub", %fields, "{message}"),
        "warn" => tracing::warn!(target: "sigvisor::hub", %fields, "{message}"),
        _ => tracing::error!(target: "sigvisor::hub", %fields, "{message}"),
    }
}
