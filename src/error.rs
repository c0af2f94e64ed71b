//! Error types used by the emitter, the runners and the lifecycle engine.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`]: errors raised by the core itself (bad calls, bad transitions).
//! - [`HandlerError`]: errors raised by individual handlers during an emission.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! A [`HandlerError`] always reaches the caller wrapped as [`RuntimeError::Handler`].

use std::time::Duration;
use thiserror::Error;

use crate::component::Phase;

/// # Errors produced by the core.
///
/// `InvalidArgument` and `InvalidTransition` are raised before any handler runs.
/// `Handler` carries the first handler failure of an emission; the remaining
/// handlers of that emission are abandoned.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Malformed call into `on`/`emit` (empty event type, zero limit, ...).
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the call.
        reason: String,
    },

    /// Lifecycle method called from a phase that does not allow it.
    #[error("cannot {action} from phase {phase}")]
    InvalidTransition {
        /// Requested lifecycle action (`start`, `stop`).
        action: &'static str,
        /// Phase the component was in.
        phase: Phase,
    },

    /// A handler failed during an emission.
    #[error("handler failed on {ty}: {source}")]
    Handler {
        /// Event type being emitted.
        ty: String,
        /// The underlying handler error.
        #[source]
        source: HandlerError,
    },

    /// Stopping the application exceeded its grace period.
    #[error("stop timeout {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Components that had not reached `finalized`.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Shorthand for [`RuntimeError::InvalidArgument`].
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        RuntimeError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use sigvisor::RuntimeError;
    ///
    /// let err = RuntimeError::invalid_argument("empty event type");
    /// assert_eq!(err.as_label(), "runtime_invalid_argument");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidArgument { .. } => "runtime_invalid_argument",
            RuntimeError::InvalidTransition { .. } => "runtime_invalid_transition",
            RuntimeError::Handler { .. } => "runtime_handler",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidArgument { reason } => format!("invalid argument: {reason}"),
            RuntimeError::InvalidTransition { action, phase } => {
                format!("{action} not allowed in phase {phase}")
            }
            RuntimeError::Handler { ty, source } => {
                format!("type={ty} {}", source.as_message())
            }
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck components={stuck:?}")
            }
        }
    }

    /// Converts the error for propagation out of a handler: a nested handler
    /// failure is passed through, anything else becomes [`HandlerError::Fail`].
    pub fn into_handler_error(self) -> HandlerError {
        match self {
            RuntimeError::Handler { source, .. } => source,
            other => HandlerError::fail(other.to_string()),
        }
    }

    /// Returns the handler error if this is a [`RuntimeError::Handler`].
    pub fn handler_error(&self) -> Option<&HandlerError> {
        match self {
            RuntimeError::Handler { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// # Errors produced by handler execution.
///
/// A handler either returns one of these, panics (converted to
/// [`HandlerError::Panicked`]), or suspends inside a synchronous emission
/// (reported as [`HandlerError::Suspended`]).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler reported a failure.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler panicked while running.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// Handler returned a pending future inside a synchronous emission.
    #[error("handler suspended inside a synchronous emission")]
    Suspended,
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use sigvisor::HandlerError;
    ///
    /// let err = HandlerError::fail("boom");
    /// assert_eq!(err.as_label(), "handler_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_failed",
            HandlerError::Panicked { .. } => "handler_panicked",
            HandlerError::Suspended => "handler_suspended",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
            HandlerError::Suspended => "suspended in synchronous emission".to_string(),
        }
    }

    /// Converts a caught panic payload into [`HandlerError::Panicked`].
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        HandlerError::Panicked { info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = RuntimeError::InvalidTransition {
            action: "stop",
            phase: Phase::Absent,
        };
        assert_eq!(err.as_label(), "runtime_invalid_transition");
        assert_eq!(err.to_string(), "cannot stop from phase absent");

        let err = RuntimeError::Handler {
            ty: "sig/start".into(),
            source: HandlerError::Suspended,
        };
        assert_eq!(err.as_label(), "runtime_handler");
        assert_eq!(err.handler_error(), Some(&HandlerError::Suspended));
    }

    #[test]
    fn test_panic_payload_conversion() {
        let err = HandlerError::from_panic(Box::new("boom"));
        assert_eq!(err, HandlerError::Panicked { info: "boom".into() });

        let err = HandlerError::from_panic(Box::new(String::from("owned")));
        assert_eq!(err, HandlerError::Panicked { info: "owned".into() });

        let err = HandlerError::from_panic(Box::new(7_u32));
        assert_eq!(err, HandlerError::Panicked { info: "unknown panic".into() });
    }
}
