//! # Declared handler bindings.
//!
//! A component lists its handlers as `(key, callback)` pairs. The key has the
//! shape `<group>[:<feature>]/<type>`:
//!
//! ```text
//! sig/start            signal handler, registered at build time
//! on/resize            local handler, wired on sig/initialize
//! one/ready            local handler with limit 1, wired on sig/initialize
//! hub/window/size      hub subscription, wired on sig/initialize
//! hub:memory/user      hub subscription replayed from memory on sig/start
//! ```
//!
//! Keys are parsed once, when the binding is declared.

use std::fmt;
use std::str::FromStr;

use crate::callbacks::CallbackRef;
use crate::error::RuntimeError;

/// Binding group: which registration path a binding goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// Lifecycle signal (`sig/*`) on the component's own emitter.
    Sig,
    /// Local handler (`on/*`).
    On,
    /// Local handler that runs once (`one/*`, registered as `on/*`).
    One,
    /// Hub subscription.
    Hub,
}

impl Group {
    fn as_str(self) -> &'static str {
        match self {
            Group::Sig => "sig",
            Group::On => "on",
            Group::One => "one",
            Group::Hub => "hub",
        }
    }
}

/// Optional binding feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Hub only: replay the topic memory when the component starts.
    Memory,
}

/// Parsed `<group>[:<feature>]/<type>` key.
///
/// ## Example
/// ```rust
/// use sigvisor::{BindingKey, Feature, Group};
///
/// let key: BindingKey = "hub:memory/window/size".parse().unwrap();
/// assert_eq!(key.group(), Group::Hub);
/// assert_eq!(key.feature(), Some(Feature::Memory));
/// assert_eq!(key.ty(), "window/size");
///
/// assert!("one:memory/x".parse::<BindingKey>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingKey {
    group: Group,
    feature: Option<Feature>,
    ty: String,
}

impl BindingKey {
    /// Creates a key, validating the group/feature combination.
    pub fn new(group: Group, feature: Option<Feature>, ty: impl Into<String>) -> Result<Self, RuntimeError> {
        let ty = ty.into();
        if ty.is_empty() {
            return Err(RuntimeError::invalid_argument(format!(
                "binding {} has no type",
                group.as_str()
            )));
        }
        if feature.is_some() && group != Group::Hub {
            return Err(RuntimeError::invalid_argument(format!(
                "feature memory is only valid for hub bindings, got {}",
                group.as_str()
            )));
        }
        Ok(Self { group, feature, ty })
    }

    /// Binding group.
    #[inline]
    pub fn group(&self) -> Group {
        self.group
    }

    /// Binding feature.
    #[inline]
    pub fn feature(&self) -> Option<Feature> {
        self.feature
    }

    /// Type part of the key (hub topic for hub bindings).
    #[inline]
    pub fn ty(&self) -> &str {
        &self.ty
    }

    /// Returns true for a hub binding replayed from memory on start.
    #[inline]
    pub fn is_memory(&self) -> bool {
        self.feature == Some(Feature::Memory)
    }

    /// Event type the handler is registered under.
    ///
    /// `sig/x` and `on/x` keep their prefix, `one/x` registers as `on/x`,
    /// hub bindings use the bare topic.
    pub fn event_type(&self) -> String {
        match self.group {
            Group::Sig => format!("sig/{}", self.ty),
            Group::On | Group::One => format!("on/{}", self.ty),
            Group::Hub => self.ty.clone(),
        }
    }
}

impl FromStr for BindingKey {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((head, ty)) = s.split_once('/') else {
            return Err(RuntimeError::invalid_argument(format!(
                "binding key {s:?} is not <group>[:<feature>]/<type>"
            )));
        };
        let (group, feature) = match head.split_once(':') {
            Some((group, feature)) => (group, Some(feature)),
            None => (head, None),
        };
        let group = match group {
            "sig" => Group::Sig,
            "on" => Group::On,
            "one" => Group::One,
            "hub" => Group::Hub,
            other => {
                return Err(RuntimeError::invalid_argument(format!(
                    "unknown binding group {other:?} in {s:?}"
                )));
            }
        };
        let feature = match feature {
            None => None,
            Some("memory") => Some(Feature::Memory),
            Some(other) => {
                return Err(RuntimeError::invalid_argument(format!(
                    "unknown binding feature {other:?} in {s:?}"
                )));
            }
        };
        BindingKey::new(group, feature, ty)
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group.as_str())?;
        if self.is_memory() {
            f.write_str(":memory")?;
        }
        write!(f, "/{}", self.ty)
    }
}

/// A declared `(key, callback)` pair.
#[derive(Clone)]
pub struct Binding {
    key: BindingKey,
    callback: CallbackRef,
}

impl Binding {
    /// Pairs `key` with `callback`.
    pub fn new(key: BindingKey, callback: CallbackRef) -> Self {
        Self { key, callback }
    }

    /// Parsed key.
    #[inline]
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    /// Callback.
    #[inline]
    pub fn callback(&self) -> &CallbackRef {
        &self.callback
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("key", &self.key.to_string())
            .field("callback", &self.callback.name())
            .finish()
    }
}
