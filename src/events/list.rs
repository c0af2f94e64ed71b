//! # Per-type handler list.
//!
//! [`HandlerList`] is a singly linked list of [`Handler`]s stored in an arena:
//! nodes live in a `Vec` slot table and link to each other by slot index, with
//! freed slots reused by later appends.
//!
//! ```text
//! head ──► [slot 2] ──► [slot 0] ──► [slot 3] ◄── tail
//!            next=0       next=3       next=None
//! free: [1]
//! ```
//!
//! ## Rules
//! - Append is O(1) (through `tail`), removal is O(n) (walk from `head`).
//! - Iteration order is insertion order and survives removals.
//! - `head` and `tail` are both `None` exactly when the list is empty.
//! - `handled` is the generation counter; every emission bumps it.
//! - `memory` is the argument list of the last completed emission, tagged
//!   with that emission's generation. Replays target that generation, so a
//!   later halted or failed emission does not reopen it.

use std::sync::Arc;

use crate::callbacks::Args;
use crate::events::handler::{Handler, HandlerId};

struct Node {
    handler: Arc<Handler>,
    next: Option<usize>,
}

/// Linked list of handlers registered for one event type.
pub struct HandlerList {
    ty: Arc<str>,
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    memory: Option<(u64, Args)>,
    handled: u64,
}

impl HandlerList {
    pub(crate) fn new(ty: Arc<str>) -> Self {
        Self {
            ty,
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            memory: None,
            handled: 0,
        }
    }

    /// Event type of this list.
    #[inline]
    pub fn ty(&self) -> &str {
        &self.ty
    }

    /// Number of linked handlers.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when no handler is linked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// First handler.
    pub fn head(&self) -> Option<&Arc<Handler>> {
        self.head.and_then(|i| self.node(i)).map(|n| &n.handler)
    }

    /// Last handler.
    pub fn tail(&self) -> Option<&Arc<Handler>> {
        self.tail.and_then(|i| self.node(i)).map(|n| &n.handler)
    }

    /// Memoized arguments of the last completed emission.
    #[inline]
    pub fn memory(&self) -> Option<&Args> {
        self.memory.as_ref().map(|(_, args)| args)
    }

    /// Generation that produced the memory.
    #[inline]
    pub fn memory_generation(&self) -> Option<u64> {
        self.memory.as_ref().map(|(generation, _)| *generation)
    }

    /// Current generation (`0` before the first emission).
    #[inline]
    pub fn handled(&self) -> u64 {
        self.handled
    }

    /// Iterates handlers in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut Node> {
        self.nodes.get_mut(index).and_then(Option::as_mut)
    }

    /// Appends `handler` at the tail.
    pub(crate) fn push(&mut self, handler: Arc<Handler>) {
        let node = Node {
            handler,
            next: None,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };

        match self.tail.and_then(|t| self.node_mut(t)) {
            Some(tail) => tail.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
    }

    /// Unlinks every handler matching `pred`, returning them in list order.
    pub(crate) fn remove_where(&mut self, mut pred: impl FnMut(&Handler) -> bool) -> Vec<Arc<Handler>> {
        let mut removed = Vec::new();
        let mut prev: Option<usize> = None;
        let mut cursor = self.head;

        while let Some(index) = cursor {
            let Some(node) = self.node(index) else { break };
            let next = node.next;

            if pred(&*node.handler) {
                match prev.and_then(|p| self.node_mut(p)) {
                    Some(p) => p.next = next,
                    None => self.head = next,
                }
                if self.tail == Some(index) {
                    self.tail = prev;
                }
                if let Some(node) = self.nodes[index].take() {
                    removed.push(node.handler);
                }
                self.free.push(index);
                self.len -= 1;
            } else {
                prev = Some(index);
            }
            cursor = next;
        }

        if self.head.is_none() {
            // Fully drained: drop the slot table so a refilled list starts pristine.
            self.nodes.clear();
            self.free.clear();
            self.tail = None;
        }
        removed
    }

    /// Unlinks the handler with `id`.
    pub(crate) fn remove(&mut self, id: HandlerId) -> Option<Arc<Handler>> {
        self.remove_where(|h| h.id() == id).pop()
    }

    /// Bumps and returns the generation counter.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.handled += 1;
        self.handled
    }

    /// Records `args` as the memory of `generation`; an older generation
    /// settling late never replaces a newer memory.
    pub(crate) fn set_memory(&mut self, generation: u64, args: Args) {
        if self.memory_generation().is_some_and(|current| current > generation) {
            return;
        }
        self.memory = Some((generation, args));
    }

    /// Copies the handlers passing `pred` that have not run for `generation`.
    pub(crate) fn snapshot(
        &self,
        generation: u64,
        mut pred: impl FnMut(&Handler) -> bool,
    ) -> Vec<Arc<Handler>> {
        self.iter()
            .filter(|&h| h.handled() < generation && pred(&**h))
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for HandlerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerList")
            .field("ty", &self.ty)
            .field("len", &self.len)
            .field("head", &self.head.is_some())
            .field("tail", &self.tail.is_some())
            .field("memory", &self.memory)
            .field("handled", &self.handled)
            .finish()
    }
}

/// Insertion-order iterator over a [`HandlerList`].
pub struct Iter<'a> {
    list: &'a HandlerList,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Arc<Handler>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor?)?;
        self.cursor = node.next;
        Some(&node.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{CallbackRef, SyncCallbackFn};
    use crate::events::emitter::EmitterId;
    use crate::events::handler::HandlerSpec;

    fn make(list: &HandlerList) -> Arc<Handler> {
        let cb: CallbackRef = SyncCallbackFn::arc("noop", |_| Ok(None));
        Arc::new(HandlerSpec::new(cb).into_handler(EmitterId::next(), Arc::from(list.ty())))
    }

    fn ids(list: &HandlerList) -> Vec<HandlerId> {
        list.iter().map(|h| h.id()).collect()
    }

    #[test]
    fn test_push_preserves_order() {
        let mut list = HandlerList::new(Arc::from("on/a"));
        let hs: Vec<_> = (0..4).map(|_| make(&list)).collect();
        for h in &hs {
            list.push(Arc::clone(h));
        }
        assert_eq!(ids(&list), hs.iter().map(|h| h.id()).collect::<Vec<_>>());
        assert_eq!(list.len(), 4);
        assert_eq!(list.head().map(|h| h.id()), Some(hs[0].id()));
        assert_eq!(list.tail().map(|h| h.id()), Some(hs[3].id()));
    }

    #[test]
    fn test_remove_middle_head_and_tail() {
        let mut list = HandlerList::new(Arc::from("on/a"));
        let hs: Vec<_> = (0..5).map(|_| make(&list)).collect();
        for h in &hs {
            list.push(Arc::clone(h));
        }

        assert!(list.remove(hs[2].id()).is_some());
        assert_eq!(ids(&list), vec![hs[0].id(), hs[1].id(), hs[3].id(), hs[4].id()]);

        assert!(list.remove(hs[0].id()).is_some());
        assert_eq!(list.head().map(|h| h.id()), Some(hs[1].id()));

        assert!(list.remove(hs[4].id()).is_some());
        assert_eq!(list.tail().map(|h| h.id()), Some(hs[3].id()));

        // reused slot goes to the tail, not to its old position
        let late = make(&list);
        list.push(Arc::clone(&late));
        assert_eq!(ids(&list), vec![hs[1].id(), hs[3].id(), late.id()]);
    }

    #[test]
    fn test_removing_only_handler_clears_head_and_tail() {
        let mut list = HandlerList::new(Arc::from("on/a"));
        let h = make(&list);
        list.push(Arc::clone(&h));
        assert!(list.remove(h.id()).is_some());
        assert!(list.head().is_none());
        assert!(list.tail().is_none());
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut list = HandlerList::new(Arc::from("on/a"));
        let h = make(&list);
        list.push(Arc::clone(&h));
        let other = make(&list);
        assert!(list.remove(other.id()).is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_snapshot_skips_handled_generation() {
        let mut list = HandlerList::new(Arc::from("on/a"));
        let a = make(&list);
        let b = make(&list);
        list.push(Arc::clone(&a));
        list.push(Arc::clone(&b));

        let generation = list.next_generation();
        assert!(matches!(a.claim(generation), crate::events::handler::Claim::Run { .. }));

        let snap = list.snapshot(generation, |_| true);
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id(), b.id());
    }

    #[test]
    fn test_memory_keeps_newest_generation() {
        let mut list = HandlerList::new(Arc::from("hub/a"));
        let first = list.next_generation();
        let second = list.next_generation();

        list.set_memory(second, vec![serde_json::json!(2)]);
        list.set_memory(first, vec![serde_json::json!(1)]);
        assert_eq!(list.memory(), Some(&vec![serde_json::json!(2)]));
        assert_eq!(list.memory_generation(), Some(second));
    }
}
