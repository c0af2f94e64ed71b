//! # Handler execution context.
//!
//! A [`Context`] is the scope a handler is registered under. It plays two roles:
//! - **identity**: `off`, scoped emissions and `republish` select handlers by
//!   pointer identity of their context;
//! - **phase**: the phase-aware [`Executor`](crate::Executor) skips handlers whose
//!   context reports a protected [`Phase`].
//!
//! [`Component`](crate::Component) is the main implementor. [`Detached`] is a
//! plain named scope for subscribers that are not components.

use std::borrow::Cow;
use std::sync::Arc;

use crate::component::Phase;

/// Shared handle to a context object.
pub type ContextRef = Arc<dyn Context>;

/// Execution scope of a handler.
pub trait Context: Send + Sync + 'static {
    /// Returns the current lifecycle phase, if this context has one.
    fn phase(&self) -> Option<Phase> {
        None
    }

    /// Returns a human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A named context without a lifecycle.
#[derive(Debug, Clone)]
pub struct Detached {
    name: Cow<'static, str>,
}

impl Detached {
    /// Creates a detached context and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }
}

impl Context for Detached {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Identity comparison for contexts.
#[inline]
pub(crate) fn same_context(a: &ContextRef, b: &ContextRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
