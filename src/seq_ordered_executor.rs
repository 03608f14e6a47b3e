// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequence-ordered executor: "execute-first, drain-on-gap" dispatch over
//! a [`ReorderBuffer`], giving strict global `sequence_stamp` order across
//! every subscriber bound to this executor.
//!
//! Each turn first drains everything the buffer can already release in
//! order; only once that runs dry does it pull one subscriber off the
//! ready queue and bounded-drain it (at most
//! [`crate::config::DEFAULT_MAX_DRAIN_PER_SUBSCRIBER`] entries) into the
//! buffer, so one chatty subscriber can never starve the others — the
//! bound caps how much of one subscriber's backlog a single turn can
//! absorb before control returns to the ready queue.

use crate::any_subscriber::AnySubscriber;
use crate::callback_group::ReadyQueueSink;
use crate::config::SeqOrderedConfig;
use crate::error::Error;
use crate::node::Node;
use crate::executor_base::ExecutorCore;
use crate::reorder_buffer::{ReorderBuffer, ReorderStats};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Fallback-map size past which a reorder-window-exceeded diagnostic is
/// logged. Purely observational; the executor keeps running regardless.
const REORDER_WINDOW_WARN_THRESHOLD: usize = 4096;

/// Dispatches ready subscribers through a [`ReorderBuffer`] so callbacks
/// fire in strict, globally increasing `sequence_stamp` order.
pub struct SeqOrderedExecutor {
    core: ExecutorCore,
    buffer: Mutex<ReorderBuffer>,
    max_drain_per_subscriber: usize,
}

impl SeqOrderedExecutor {
    /// Creates a sequence-ordered executor with the given ring/drain
    /// sizing.
    #[must_use]
    pub fn new(config: SeqOrderedConfig) -> Arc<Self> {
        Arc::new(Self {
            core: ExecutorCore::new(),
            buffer: Mutex::new(ReorderBuffer::new(config.ring_capacity)),
            max_drain_per_subscriber: config.max_drain_per_subscriber,
        })
    }

    /// Creates a sequence-ordered executor using the crate's default
    /// ring capacity and bounded-drain size.
    #[must_use]
    pub fn with_defaults() -> Arc<Self> {
        Self::new(SeqOrderedConfig::default())
    }

    /// Registers `node`'s default callback group with this executor.
    pub fn add_node(self: &Arc<Self>, node: &Arc<Node>) {
        let sink: Arc<dyn ReadyQueueSink> = self.clone();
        self.core.add_node(node, &sink);
    }

    /// Unregisters `node` from this executor.
    pub fn remove_node(&self, node: &Arc<Node>) {
        self.core.remove_node(node);
    }

    fn drain_into_buffer(&self, sub: &Arc<dyn AnySubscriber>) {
        let entries = sub.drain_exec_some(self.max_drain_per_subscriber);
        let mut buffer = self.buffer.lock();
        for entry in entries {
            let seq = entry.seq();
            buffer.put(entry);
            if buffer.fallback_size() > REORDER_WINDOW_WARN_THRESHOLD {
                log::warn!("{}", Error::ReorderWindowExceeded { seq });
            }
        }
    }

    /// Pops and invokes every entry the buffer can currently release in
    /// order. Returns how many ran.
    fn execute_consecutive(&self) -> usize {
        let mut count = 0;
        loop {
            let next = self.buffer.lock().try_pop_next();
            match next {
                Some(entry) => {
                    count += 1;
                    if catch_unwind(AssertUnwindSafe(|| entry.invoke())).is_err() {
                        log::error!("sequence-ordered executor: a callback panicked");
                    }
                }
                None => break,
            }
        }
        count
    }

    /// One non-blocking step: either executes a run of already-consecutive
    /// buffered entries, or pulls one ready subscriber and drains it into
    /// the buffer. Returns whether either made progress, so callers can
    /// loop until the ready queue and buffer both run dry.
    fn turn_nonblocking(&self) -> bool {
        if self.execute_consecutive() > 0 {
            return true;
        }
        if let Some(sub) = self.core.try_one_ready() {
            self.drain_into_buffer(&sub);
            self.execute_consecutive();
            return true;
        }
        false
    }

    fn turn_blocking(&self) {
        if self.execute_consecutive() > 0 {
            return;
        }
        if let Some(sub) = self.core.try_one_ready() {
            self.drain_into_buffer(&sub);
            if self.execute_consecutive() > 0 {
                return;
            }
        }
        if let Some(sub) = self.core.wait_one_ready() {
            self.drain_into_buffer(&sub);
            self.execute_consecutive();
        }
    }

    /// Blocks, running the execute-first/drain-on-gap loop, until
    /// [`Self::stop`] is called.
    pub fn spin(&self) {
        self.core.start_spinning();
        log::info!("sequence-ordered executor spinning");
        while self.core.is_spinning() {
            self.turn_blocking();
        }
        log::info!("sequence-ordered executor stopped");
    }

    /// Runs non-blocking turns until neither the ready queue nor the
    /// reorder buffer can make further progress (mirroring the other
    /// executors' `spin_some`, which drain the ready queue until empty).
    pub fn spin_some(&self) {
        while self.turn_nonblocking() {}
    }

    /// Cooperative shutdown.
    pub fn stop(&self) {
        self.core.stop();
    }

    /// Releases a blocked `spin` consumer without enqueueing anything.
    pub fn wakeup(&self) {
        self.core.wakeup();
    }

    /// Number of nodes currently registered with this executor.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.core.node_count()
    }

    /// Current reorder-buffer diagnostic snapshot.
    #[must_use]
    pub fn stats(&self) -> ReorderStats {
        self.buffer.lock().stats()
    }

    /// Resets the reorder-buffer's diagnostic counters to zero.
    pub fn reset_stats(&self) {
        self.buffer.lock().reset_stats();
    }

    /// Number of entries currently buffered in the ring.
    #[must_use]
    pub fn pending_size(&self) -> usize {
        self.buffer.lock().pending_size()
    }

    /// Number of entries currently buffered in the hashmap fallback.
    #[must_use]
    pub fn fallback_size(&self) -> usize {
        self.buffer.lock().fallback_size()
    }
}

impl ReadyQueueSink for SeqOrderedExecutor {
    fn enqueue_ready(&self, sub: Arc<dyn AnySubscriber>) {
        self.core.push_ready(sub);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeqOrderedConfig;
    use crate::domain::Domain;
    use crate::node::NodeKind;
    use crate::publisher::Publisher;
    use crate::subscriber::Subscriber;
    use crate::message::Stamped;
    use parking_lot::Mutex as PMutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;
    use std::time::Duration;

    /// A message carrying an externally-assigned sequence number, shared
    /// by every producer via a single `fetch_add` counter — the
    /// multi-producer contract spec.md §4.10 places on the caller, not
    /// the executor.
    struct SeqMsg(u64);
    impl Stamped for SeqMsg {
        fn timestamp_ns(&self) -> u64 {
            self.0
        }
    }

    #[test]
    fn single_subscriber_strictly_increasing_sequence() {
        let domain = Domain::new(500);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let exec = SeqOrderedExecutor::with_defaults();
        exec.add_node(&node);

        let seen = Arc::new(PMutex::new(Vec::new()));
        let seen2 = seen.clone();
        let _sub = Subscriber::new("/t", &node, move |v: Arc<i32>| {
            seen2.lock().push(*v);
        })
        .unwrap();
        let publisher = Publisher::<i32>::new("/t", &node).unwrap();
        for i in 0..20 {
            publisher.publish(i);
        }
        exec.spin_some();
        assert_eq!(*seen.lock(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn two_subscribers_merge_into_one_global_sequence() {
        let domain = Domain::new(501);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let exec = SeqOrderedExecutor::with_defaults();
        exec.add_node(&node);

        let order = Arc::new(PMutex::new(Vec::new()));
        let order_a = order.clone();
        let sub_a = Subscriber::new_stamped("/a", &node, move |v: Arc<SeqMsg>| {
            order_a.lock().push(v.0);
        })
        .unwrap();
        let order_b = order.clone();
        let sub_b = Subscriber::new_stamped("/b", &node, move |v: Arc<SeqMsg>| {
            order_b.lock().push(v.0);
        })
        .unwrap();

        let pub_a = Publisher::<SeqMsg>::new("/a", &node).unwrap();
        let pub_b = Publisher::<SeqMsg>::new("/b", &node).unwrap();

        let shared_seq = AtomicU64::new(0);
        for round in 0..10u64 {
            let seq = shared_seq.fetch_add(1, Ordering::SeqCst);
            if round % 2 == 0 {
                pub_a.publish(SeqMsg(seq));
            } else {
                pub_b.publish(SeqMsg(seq));
            }
        }
        let _ = (&sub_a, &sub_b);

        exec.spin_some();
        assert_eq!(*order.lock(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn starvation_freedom_bounded_drain_lets_other_subscriber_progress() {
        // The reorder buffer assumes a single global sequence authority
        // (spec.md §4.10), so both subscribers here are stamped and share
        // one counter — a non-stamped subscriber's own `local_seq` starts
        // at 0 independently of any other subscriber, which is not a valid
        // shared sequence and would make B's message look `TooOld` as soon
        // as A's backlog advances `next_seq` past it.
        let domain = Domain::new(502);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let config = SeqOrderedConfig {
            ring_capacity: 1024,
            max_drain_per_subscriber: 4,
        };
        let exec = SeqOrderedExecutor::new(config);
        exec.add_node(&node);

        let seen_a = Arc::new(PMutex::new(0usize));
        let seen_a2 = seen_a.clone();
        let sub_a = Subscriber::new_stamped("/a", &node, move |_v: Arc<SeqMsg>| {
            *seen_a2.lock() += 1;
        })
        .unwrap();
        let seen_b = Arc::new(PMutex::new(0usize));
        let seen_b2 = seen_b.clone();
        let sub_b = Subscriber::new_stamped("/b", &node, move |_v: Arc<SeqMsg>| {
            *seen_b2.lock() += 1;
        })
        .unwrap();

        let pub_a = Publisher::<SeqMsg>::new("/a", &node).unwrap();
        let pub_b = Publisher::<SeqMsg>::new("/b", &node).unwrap();

        // A holds the tail of the sequence (1..=100); none of it can
        // execute until B's single message (seq 0) arrives. Since `spin_some`
        // now runs to quiescence in one call (see `turn_nonblocking`), this
        // test drives individual turns directly to observe that B gets
        // drained within a few turns rather than only after A's entire
        // backlog.
        for i in 1..=100u64 {
            pub_a.publish(SeqMsg(i));
        }
        pub_b.publish(SeqMsg(0));

        for _ in 0..(100 / 4 + 2) {
            exec.turn_nonblocking();
            if *seen_b.lock() > 0 {
                break;
            }
        }
        let _ = (&sub_a, &sub_b);
        assert!(*seen_b.lock() > 0, "B should have made progress within a few turns");
        assert!(
            *seen_a.lock() < 100,
            "A's entire backlog should not have drained before B got a turn"
        );
    }

    #[test]
    fn stats_report_ring_hits_under_normal_interleaving() {
        let domain = Domain::new(503);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let exec = SeqOrderedExecutor::with_defaults();
        exec.add_node(&node);

        let _sub = Subscriber::new("/t", &node, |_v: Arc<i32>| {}).unwrap();
        let publisher = Publisher::<i32>::new("/t", &node).unwrap();
        for i in 0..1000 {
            publisher.publish(i);
        }
        exec.spin_some();
        let stats = exec.stats();
        assert_eq!(stats.discarded_old, 0);
        assert!(stats.ring_put_ok >= 1000);
    }

    #[test]
    fn spin_stops_cooperatively() {
        let domain = Domain::new(504);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let exec = SeqOrderedExecutor::with_defaults();
        exec.add_node(&node);

        let exec2 = exec.clone();
        let handle = thread::spawn(move || exec2.spin());
        thread::sleep(Duration::from_millis(20));
        exec.stop();
        handle.join().unwrap();
    }
}
