// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Top-level namespace owning a Topic registry (keyed by name) and a Node
//! registry.
//!
//! A Domain holds no threads; it is purely two registries plus a stable
//! id. The topic registry is keyed by name but the value type must be
//! type-erased (`Arc<dyn Any + Send + Sync>`, always a `Topic<T>` for
//! whichever `T` first created the entry) because Rust has no runtime
//! template instantiation — `Arc::downcast` back to `Topic<T>` is the
//! idiomatic substitute for the original's hand-rolled `type_tag`
//! equality check, and downcast failure *is* the Type-Mismatch error.

use crate::error::{Error, Result};
use crate::node::Node;
use crate::registry::{QueryableRegistry, Registry};
use crate::topic::Topic;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

/// A namespace owning a node registry and a name-keyed topic registry.
pub struct Domain {
    id: u64,
    nodes: Registry<Node>,
    topics: QueryableRegistry<dyn Any + Send + Sync>,
    next_node_id: AtomicU64,
}

impl Domain {
    /// Creates a new, empty domain with the given id.
    #[must_use]
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(Self {
            id,
            nodes: Registry::new(),
            topics: QueryableRegistry::new(),
            next_node_id: AtomicU64::new(0),
        })
    }

    /// The process-wide default domain (id 0), lazily constructed once
    /// per process.
    #[must_use]
    pub fn default() -> Arc<Self> {
        static DEFAULT: OnceLock<Arc<Domain>> = OnceLock::new();
        DEFAULT.get_or_init(|| Domain::new(0)).clone()
    }

    /// This domain's stable id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn next_node_id(&self) -> u64 {
        self.next_node_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn track_node(&self, node: &Arc<Node>) {
        self.nodes.track(node);
    }

    /// Number of currently live nodes assigned to this domain.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of currently live topics in this domain.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Returns the live `Topic<T>` named `name`, creating one if absent.
    /// Idempotent by name while at least one handle to it is alive.
    /// Fails with [`Error::TypeMismatch`] if `name` already resolves to a
    /// topic of a different type.
    pub fn create_or_get_topic<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<Topic<T>>> {
        let (any, _idx) = self.topics.emplace_with(name, |idx| {
            Arc::new(Topic::<T>::new(name.to_string(), idx)) as Arc<dyn Any + Send + Sync>
        });
        any.downcast::<Topic<T>>().map_err(|_| Error::TypeMismatch)
    }

    /// Always creates a fresh node, even if one with the same name
    /// already exists under this domain.
    #[must_use]
    pub fn assign_node(self: &Arc<Self>, name: impl Into<String>, kind: crate::node::NodeKind) -> Arc<Node> {
        Node::new(name, self, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    #[test]
    fn create_or_get_topic_is_idempotent_by_name() {
        let domain = Domain::new(1);
        let a = domain.create_or_get_topic::<i32>("t").unwrap();
        let b = domain.create_or_get_topic::<i32>("t").unwrap();
        assert_eq!(a.id(), b.id());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn create_or_get_topic_mints_fresh_topic_after_gc() {
        let domain = Domain::new(1);
        let id1;
        {
            let a = domain.create_or_get_topic::<i32>("t").unwrap();
            id1 = a.id();
        }
        let b = domain.create_or_get_topic::<i32>("t").unwrap();
        assert_ne!(id1, b.id());
    }

    #[test]
    fn create_or_get_topic_rejects_type_mismatch() {
        let domain = Domain::new(1);
        let _a = domain.create_or_get_topic::<i32>("t").unwrap();
        let err = domain.create_or_get_topic::<String>("t").unwrap_err();
        assert_eq!(err, Error::TypeMismatch);
    }

    #[test]
    fn assign_node_always_creates_a_fresh_node() {
        let domain = Domain::new(1);
        let n1 = domain.assign_node("n", NodeKind::Intraprocess);
        let n2 = domain.assign_node("n", NodeKind::Intraprocess);
        assert_ne!(n1.id(), n2.id());
        assert_eq!(domain.node_count(), 2);
    }

    #[test]
    fn default_domain_is_a_process_wide_singleton() {
        let a = Domain::default();
        let b = Domain::default();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.id(), 0);
    }
}
