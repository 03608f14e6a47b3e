// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logical participant grouping publishers, subscribers, and callback
//! groups under one name.
//!
//! A node does not own its publishers and subscribers the way the
//! original's registry scheme does — here they hold a strong reference
//! back to the domain/topic they need to stay alive, and the node's own
//! `Arc` is simply shared by whoever constructed them. What the node does
//! own strongly is its callback groups, including the one default group
//! every node gets for free, matching `NodeBase::defaultCallbackGroup()`
//! in the reference runtime.

use crate::callback_group::{CallbackGroup, CallbackGroupKind};
use crate::domain::Domain;
use parking_lot::Mutex;
use std::sync::Arc;

/// Whether a node's endpoints are expected to stay within this process or
/// to be reachable from other processes via the external transport
/// contract (§6). The core treats both identically; `Interprocess` only
/// documents intent for the (out-of-scope) transport adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Intraprocess,
    Interprocess,
}

/// A logical participant: a name, a domain, and a set of callback groups.
pub struct Node {
    id: u64,
    name: String,
    kind: NodeKind,
    domain: Arc<Domain>,
    callback_groups: Mutex<Vec<Arc<CallbackGroup>>>,
    default_callback_group: Arc<CallbackGroup>,
}

impl Node {
    /// Creates a fresh node under `domain`. Every call creates a new
    /// node, even if one with the same name already exists — names are
    /// not unique at the node level, unlike topics.
    #[must_use]
    pub fn new(name: impl Into<String>, domain: &Arc<Domain>, kind: NodeKind) -> Arc<Self> {
        let id = domain.next_node_id();
        let default_callback_group = CallbackGroup::new_orphan(CallbackGroupKind::MutuallyExclusive);
        let node = Arc::new(Self {
            id,
            name: name.into(),
            kind,
            domain: domain.clone(),
            callback_groups: Mutex::new(vec![default_callback_group.clone()]),
            default_callback_group,
        });
        domain.track_node(&node);
        node
    }

    /// This node's stable id within its domain.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// This node's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this node is intended for intra- or inter-process use.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The domain this node belongs to.
    #[must_use]
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// The node's default callback group, used by `Publisher`/`Subscriber`
    /// constructors that do not specify one explicitly.
    #[must_use]
    pub fn default_callback_group(&self) -> Arc<CallbackGroup> {
        self.default_callback_group.clone()
    }

    /// Creates and registers a new callback group owned by this node.
    pub fn create_callback_group(&self, kind: CallbackGroupKind) -> Arc<CallbackGroup> {
        let group = CallbackGroup::new_orphan(kind);
        self.callback_groups.lock().push(group.clone());
        group
    }

    /// Number of callback groups currently owned by this node (including
    /// the default one).
    #[must_use]
    pub fn callback_group_count(&self) -> usize {
        self.callback_groups.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_node_starts_with_one_default_callback_group() {
        let domain = Domain::new(5);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        assert_eq!(node.callback_group_count(), 1);
    }

    #[test]
    fn create_callback_group_registers_into_node() {
        let domain = Domain::new(5);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let _g = node.create_callback_group(CallbackGroupKind::Reentrant);
        assert_eq!(node.callback_group_count(), 2);
    }

    #[test]
    fn node_construction_registers_with_its_domain() {
        let domain = Domain::new(5);
        assert_eq!(domain.node_count(), 0);
        let _n1 = Node::new("a", &domain, NodeKind::Intraprocess);
        let _n2 = Node::new("b", &domain, NodeKind::Intraprocess);
        assert_eq!(domain.node_count(), 2);
    }
}
