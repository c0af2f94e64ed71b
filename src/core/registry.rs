//! # Component registry.
//!
//! Keeps track of the components that are currently initialized. Components
//! add themselves while handling `sig/initialize` and remove themselves at the
//! end of `sig/finalize`.
//!
//! ## Architecture
//! ```text
//! Component.start()
//!   └─► sig/initialize ─► Registry.register(component)  ─► sig/register
//! Component.stop()
//!   └─► sig/finalize   ─► sig/unregister ─► Registry.unregister(key)
//! ```
//!
//! ## Rules
//! - Entries are keyed by [`Component::key`] (`name@id`), so two components may
//!   share a name.
//! - The registry holds weak references; it never keeps a component alive.
//! - One registry per application, shared by every component it builds.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tracing::trace;

use crate::component::Component;

/// Registry of initialized components.
#[derive(Default)]
pub struct Registry {
    components: RwLock<HashMap<String, Weak<Component>>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Adds `component`; returns false when its key was already present.
    pub async fn register(&self, component: &Arc<Component>) -> bool {
        let key = component.key();
        let mut components = self.components.write().await;
        let fresh = components.insert(key.clone(), Arc::downgrade(component)).is_none();
        trace!(component = %key, fresh, "registered");
        fresh
    }

    /// Removes the entry for `key`; returns true when it existed.
    pub async fn unregister(&self, key: &str) -> bool {
        let removed = self.components.write().await.remove(key).is_some();
        trace!(component = key, removed, "unregistered");
        removed
    }

    /// Looks up a live component by key.
    pub async fn get(&self, key: &str) -> Option<Arc<Component>> {
        self.components.read().await.get(key).and_then(Weak::upgrade)
    }

    /// Returns sorted list of registered keys.
    pub async fn list(&self) -> Vec<String> {
        let components = self.components.read().await;
        let mut keys: Vec<String> = components.keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Returns true if registry is empty.
    pub async fn is_empty(&self) -> bool {
        self.components.read().await.is_empty()
    }

    /// Number of registered components.
    pub async fn len(&self) -> usize {
        self.components.read().await.len()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_unregister() {
        let registry = Registry::new();
        let a = Component::builder("a").build().unwrap();
        let b = Component::builder("b").build().unwrap();

        assert!(registry.register(&b).await);
        assert!(registry.register(&a).await);
        assert!(!registry.register(&a).await);

        let keys = registry.list().await;
        assert_eq!(keys, {
            let mut k = vec![a.key(), b.key()];
            k.sort_unstable();
            k
        });
        assert!(registry.get(&a.key()).await.is_some_and(|c| Arc::ptr_eq(&c, &a)));

        assert!(registry.unregister(&a.key()).await);
        assert!(!registry.unregister(&a.key()).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_dropped_component_is_not_returned() {
        let registry = Registry::new();
        let key = {
            let c = Component::builder("gone").build().unwrap();
            registry.register(&c).await;
            c.key()
        };
        assert!(registry.get(&key).await.is_none());
    }
}
