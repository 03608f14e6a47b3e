// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed receive end: owns a bounded queue, stamps arrivals, and exposes
//! the two drain interfaces executors use.
//!
//! All subscriber teardown (removal from topic and callback group) happens
//! in [`Drop`], which only runs once every `Arc<Subscriber<T>>` — held by
//! the caller and by nothing else, since the topic and callback group only
//! ever hold `Weak` references — has gone away.

use crate::any_subscriber::AnySubscriber;
use crate::callback_group::{CallbackGroup, CallbackGroupKind};
use crate::config::QueueConfig;
use crate::error::{Error, Result};
use crate::exec_entry::{ExecEntry, TimeExecEntry};
use crate::message::{OrderedItem, Stamped};
use crate::node::Node;
use crate::topic::Topic;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

fn extract_stamp<T: Stamped>(value: &T) -> u64 {
    value.timestamp_ns()
}

/// Typed receive end bound to a [`Topic<T>`].
pub struct Subscriber<T: Send + Sync + 'static> {
    id_in_topic: u64,
    #[allow(dead_code)]
    node: Option<Weak<Node>>,
    topic: Option<Arc<Topic<T>>>,
    callback_group: Arc<CallbackGroup>,
    callback: Arc<dyn Fn(Arc<T>) + Send + Sync>,
    queue: ArrayQueue<OrderedItem<T>>,
    ready: AtomicBool,
    overflow_count: AtomicU64,
    local_seq: AtomicU64,
    is_stamped: bool,
    stamp_fn: Option<fn(&T) -> u64>,
    self_weak: Weak<Subscriber<T>>,
}

impl<T: Send + Sync + 'static> Subscriber<T> {
    fn build(
        id_in_topic: u64,
        node: Option<Weak<Node>>,
        topic: Option<Arc<Topic<T>>>,
        callback_group: Arc<CallbackGroup>,
        callback: Arc<dyn Fn(Arc<T>) + Send + Sync>,
        queue_config: QueueConfig,
        is_stamped: bool,
        stamp_fn: Option<fn(&T) -> u64>,
    ) -> Arc<Self> {
        let sub = Arc::new_cyclic(|weak_self| Self {
            id_in_topic,
            node,
            topic,
            callback_group: callback_group.clone(),
            callback,
            queue: ArrayQueue::new(queue_config.capacity.max(1)),
            ready: AtomicBool::new(false),
            overflow_count: AtomicU64::new(0),
            local_seq: AtomicU64::new(0),
            is_stamped,
            stamp_fn,
            self_weak: weak_self.clone(),
        });
        let any: Arc<dyn AnySubscriber> = sub.clone();
        callback_group.add_member(&any);
        if let Some(topic) = sub.topic.as_ref() {
            topic.add_subscriber(&sub);
        }
        sub
    }

    /// Binds a non-stamped subscriber to `topic_name` on `node`'s default
    /// callback group.
    pub fn new<F>(topic_name: &str, node: &Arc<Node>, callback: F) -> Result<Arc<Self>>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        Self::new_in_group(topic_name, node, &node.default_callback_group(), callback)
    }

    /// Binds a non-stamped subscriber to `topic_name` on an explicit
    /// callback group.
    pub fn new_in_group<F>(
        topic_name: &str,
        node: &Arc<Node>,
        group: &Arc<CallbackGroup>,
        callback: F,
    ) -> Result<Arc<Self>>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        Self::new_with_config(topic_name, node, group, QueueConfig::default(), callback)
    }

    /// Binds a non-stamped subscriber with an explicit queue sizing,
    /// for callers whose ingest rate needs a larger (or smaller) bounded
    /// queue than [`QueueConfig::default`].
    pub fn new_with_config<F>(
        topic_name: &str,
        node: &Arc<Node>,
        group: &Arc<CallbackGroup>,
        queue_config: QueueConfig,
        callback: F,
    ) -> Result<Arc<Self>>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        let topic = node.domain().create_or_get_topic::<T>(topic_name)?;
        let id_in_topic = topic.next_subscriber_id();
        Ok(Self::build(
            id_in_topic,
            Some(Arc::downgrade(node)),
            Some(topic),
            group.clone(),
            Arc::new(callback),
            queue_config,
            false,
            None,
        ))
    }

    /// Subscriber-local, test-only constructor that binds to no topic and
    /// no node; used so the topic/callback-group unit tests can exercise
    /// fan-out and notification without wiring up a `Domain`.
    pub(crate) fn new_orphan<F>(id_in_topic: u64, group: Arc<CallbackGroup>, callback: F) -> Arc<Self>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        Self::build(
            id_in_topic,
            None,
            None,
            group,
            Arc::new(callback),
            QueueConfig::default(),
            false,
            None,
        )
    }

    /// The subscriber's id within its topic's subscriber set.
    #[must_use]
    pub fn id_in_topic(&self) -> u64 {
        self.id_in_topic
    }

    /// Total items dropped by the bounded queue's drop-oldest policy.
    #[must_use]
    pub fn overflow_count(&self) -> u64 {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// For network-backed subscribers this joins the receive thread; for
    /// in-process subscribers (the only kind this crate implements) it is
    /// a no-op, matching the external-transport contract.
    pub fn stop(&self) {}

    /// Delivers a freshly published value to this subscriber: computes the
    /// stamp, pushes into the bounded queue (evicting the oldest entry on
    /// overflow), and notifies the callback group if this transition
    /// wins the ready flag.
    pub(crate) fn deliver(&self, shared: Arc<T>) {
        let stamp = match self.stamp_fn {
            Some(f) if self.is_stamped => f(&shared),
            _ => self.local_seq.fetch_add(1, Ordering::Relaxed),
        };
        let item = OrderedItem::new(stamp, shared);
        if let Some(_evicted) = self.queue.force_push(item) {
            let dropped = self.overflow_count.fetch_add(1, Ordering::Relaxed) + 1;
            log::warn!(
                "subscriber {} queue overflow, {} item(s) dropped total",
                self.id_in_topic,
                dropped
            );
        }
        self.mark_ready_and_notify();
    }

    fn mark_ready_and_notify(&self) {
        if self
            .ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(strong) = self.self_weak.upgrade() {
                let any: Arc<dyn AnySubscriber> = strong;
                self.callback_group.notify(any);
            }
        }
    }
}

impl<T: Stamped + Send + Sync + 'static> Subscriber<T> {
    /// Binds a stamped subscriber to `topic_name` on `node`'s default
    /// callback group. Required to ever be drained by a time-ordered
    /// executor.
    pub fn new_stamped<F>(topic_name: &str, node: &Arc<Node>, callback: F) -> Result<Arc<Self>>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        Self::new_stamped_in_group(topic_name, node, &node.default_callback_group(), callback)
    }

    /// Binds a stamped subscriber to `topic_name` on an explicit callback
    /// group.
    pub fn new_stamped_in_group<F>(
        topic_name: &str,
        node: &Arc<Node>,
        group: &Arc<CallbackGroup>,
        callback: F,
    ) -> Result<Arc<Self>>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        Self::new_stamped_with_config(topic_name, node, group, QueueConfig::default(), callback)
    }

    /// Binds a stamped subscriber with an explicit queue sizing.
    pub fn new_stamped_with_config<F>(
        topic_name: &str,
        node: &Arc<Node>,
        group: &Arc<CallbackGroup>,
        queue_config: QueueConfig,
        callback: F,
    ) -> Result<Arc<Self>>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        let topic = node.domain().create_or_get_topic::<T>(topic_name)?;
        let id_in_topic = topic.next_subscriber_id();
        Ok(Self::build(
            id_in_topic,
            Some(Arc::downgrade(node)),
            Some(topic),
            group.clone(),
            Arc::new(callback),
            queue_config,
            true,
            Some(extract_stamp::<T>),
        ))
    }
}

impl<T: Send + Sync + 'static> AnySubscriber for Subscriber<T> {
    fn id_in_topic(&self) -> u64 {
        self.id_in_topic
    }

    fn callback_group_kind(&self) -> CallbackGroupKind {
        self.callback_group.kind()
    }

    fn is_stamped(&self) -> bool {
        self.is_stamped
    }

    fn take_all(&self) {
        while let Some(item) = self.queue.pop() {
            (self.callback)(item.message().clone());
        }
        self.ready.store(false, Ordering::Release);
        if !self.queue.is_empty() {
            self.mark_ready_and_notify();
        }
    }

    fn drain_exec_some(&self, max: usize) -> Vec<ExecEntry> {
        let mut out = Vec::new();
        for _ in 0..max {
            match self.queue.pop() {
                Some(item) => {
                    let cb = self.callback.clone();
                    let msg = item.message().clone();
                    out.push(ExecEntry::new(item.stamp(), Box::new(move || (cb)(msg))));
                }
                None => break,
            }
        }
        self.ready.store(false, Ordering::Release);
        if !self.queue.is_empty() {
            self.mark_ready_and_notify();
        }
        out
    }

    fn drain_all_stamped(&self) -> Result<Vec<TimeExecEntry>> {
        if !self.is_stamped {
            return Err(Error::NotStamped);
        }
        let mut out = Vec::new();
        while let Some(item) = self.queue.pop() {
            let cb = self.callback.clone();
            let msg = item.message().clone();
            out.push(TimeExecEntry::new(item.stamp(), Box::new(move || (cb)(msg))));
        }
        self.ready.store(false, Ordering::Release);
        if !self.queue.is_empty() {
            self.mark_ready_and_notify();
        }
        Ok(out)
    }
}

impl<T: Send + Sync + 'static> Drop for Subscriber<T> {
    fn drop(&mut self) {
        if let Some(topic) = self.topic.as_ref() {
            topic.remove_subscriber(self.id_in_topic);
        }
        self.callback_group.remove_member(self.id_in_topic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback_group::CallbackGroupKind;
    use std::sync::atomic::AtomicUsize;

    fn new_group() -> Arc<CallbackGroup> {
        CallbackGroup::new_orphan(CallbackGroupKind::MutuallyExclusive)
    }

    #[test]
    fn take_all_invokes_callback_for_every_queued_item() {
        let received = Arc::new(AtomicUsize::new(0));
        let received2 = received.clone();
        let group = new_group();
        let sub = Subscriber::new_orphan(0, group, move |v: Arc<i32>| {
            received2.fetch_add(*v as usize, Ordering::SeqCst);
        });
        sub.deliver(Arc::new(1));
        sub.deliver(Arc::new(2));
        sub.deliver(Arc::new(3));
        AnySubscriber::take_all(&*sub);
        assert_eq!(received.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn ready_transitions_at_most_once_between_take_all_calls() -> Result<()> {
        let notify_count = Arc::new(AtomicUsize::new(0));
        let notify_count2 = notify_count.clone();
        struct CountingSink(Arc<AtomicUsize>);
        impl crate::callback_group::ReadyQueueSink for CountingSink {
            fn enqueue_ready(&self, _sub: Arc<dyn AnySubscriber>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
        let group = new_group();
        let sink: Arc<dyn crate::callback_group::ReadyQueueSink> =
            Arc::new(CountingSink(notify_count2));
        group.bind_executor(&sink);

        let sub = Subscriber::new_orphan(0, group, |_v: Arc<i32>| {});
        sub.deliver(Arc::new(1));
        sub.deliver(Arc::new(2));
        sub.deliver(Arc::new(3));
        assert_eq!(notify_count.load(Ordering::SeqCst), 1);
        AnySubscriber::take_all(&*sub);
        sub.deliver(Arc::new(4));
        assert_eq!(notify_count.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[test]
    fn queue_overflow_drops_oldest_and_counts() {
        let group = new_group();
        let sub = Subscriber::new_orphan(0, group, |_v: Arc<i32>| {});
        for i in 0..(crate::config::DEFAULT_QUEUE_CAPACITY as i32 + 5) {
            sub.deliver(Arc::new(i));
        }
        assert_eq!(sub.overflow_count(), 5);
    }

    #[test]
    fn drain_exec_some_is_bounded_by_max() {
        let group = new_group();
        let sub = Subscriber::new_orphan(0, group, |_v: Arc<i32>| {});
        for i in 0..10 {
            sub.deliver(Arc::new(i));
        }
        let entries = AnySubscriber::drain_exec_some(&*sub, 4);
        assert_eq!(entries.len(), 4);
    }

    #[test]
    fn drain_all_stamped_fails_not_stamped_for_plain_subscriber() {
        let group = new_group();
        let sub = Subscriber::new_orphan(0, group, |_v: Arc<i32>| {});
        let result = AnySubscriber::drain_all_stamped(&*sub);
        assert!(matches!(result, Err(Error::NotStamped)));
    }
}
