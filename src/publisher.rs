// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed send end: synchronous fan-out into subscriber queues, no
//! internal buffering.

use crate::error::Result;
use crate::node::Node;
use crate::topic::Topic;
use std::sync::Arc;

/// A publisher bound to a single topic. Cheap to hold by value; `publish`
/// only needs `&self` so a `Publisher<T>` can be shared across threads
/// directly (it is `Send + Sync` whenever `T` is).
pub struct Publisher<T: Send + Sync + 'static> {
    id_in_topic: u64,
    topic: Arc<Topic<T>>,
}

impl<T: Send + Sync + 'static> Publisher<T> {
    /// Binds a publisher to `topic_name` under `node`'s domain.
    pub fn new(topic_name: &str, node: &Arc<Node>) -> Result<Self> {
        let topic = node.domain().create_or_get_topic::<T>(topic_name)?;
        topic.register_publisher();
        let id_in_topic = topic.next_publisher_id();
        Ok(Self { id_in_topic, topic })
    }

    /// The topic this publisher fans out on.
    #[must_use]
    pub fn topic(&self) -> &Arc<Topic<T>> {
        &self.topic
    }

    /// This publisher's id within its topic.
    #[must_use]
    pub fn id_in_topic(&self) -> u64 {
        self.id_in_topic
    }

    /// Constructs a shared message from `value` and fans it out
    /// synchronously to every subscriber currently bound to this
    /// publisher's topic.
    pub fn publish(&self, value: T) {
        self.topic.publish(value);
    }

    /// Fans out an already-shared message, avoiding a clone when the
    /// caller already holds an `Arc<T>` (e.g. forwarding a message
    /// received from elsewhere).
    pub fn publish_shared(&self, value: Arc<T>) {
        self.topic.publish_shared(value);
    }
}

impl<T: Send + Sync + 'static> Drop for Publisher<T> {
    fn drop(&mut self) {
        self.topic.unregister_publisher();
    }
}
