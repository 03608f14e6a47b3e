// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Time-ordered executor: releases callbacks in non-decreasing
//! `timestamp_ns` order, holding back anything newer than
//! `max_timestamp_seen - time_offset` to absorb jitter.
//!
//! Every subscriber handled here must carry the stamped capability
//! ([`crate::message::Stamped`], i.e. constructed via
//! `Subscriber::new_stamped`); draining a non-stamped subscriber's queue
//! fails with [`Error::NotStamped`] and the entry is simply skipped
//! rather than aborting the whole turn, since one misconfigured
//! subscriber should not wedge the others.

use crate::any_subscriber::AnySubscriber;
use crate::callback_group::ReadyQueueSink;
use crate::config::DEFAULT_TIME_OFFSET_NS;
use crate::exec_entry::TimeExecEntry;
use crate::executor_base::ExecutorCore;
use crate::node::Node;
use parking_lot::Mutex;
use std::collections::BinaryHeap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Releases stamped messages in non-decreasing timestamp order, bounded
/// by a configurable lateness watermark.
pub struct TimeOrderedExecutor {
    core: ExecutorCore,
    heap: Mutex<BinaryHeap<TimeExecEntry>>,
    max_timestamp_seen: AtomicU64,
    time_offset_ns: u64,
}

impl TimeOrderedExecutor {
    /// Creates a time-ordered executor with the given bounded-lateness
    /// watermark (nanoseconds). `time_offset_ns == 0` releases everything
    /// immediately, i.e. no jitter absorption.
    #[must_use]
    pub fn new(time_offset_ns: u64) -> Arc<Self> {
        Arc::new(Self {
            core: ExecutorCore::new(),
            heap: Mutex::new(BinaryHeap::new()),
            max_timestamp_seen: AtomicU64::new(0),
            time_offset_ns,
        })
    }

    /// Creates a time-ordered executor using the crate default offset
    /// (zero — release everything immediately).
    #[must_use]
    pub fn with_default_offset() -> Arc<Self> {
        Self::new(DEFAULT_TIME_OFFSET_NS)
    }

    /// The configured bounded-lateness watermark, in nanoseconds.
    #[must_use]
    pub fn time_offset_ns(&self) -> u64 {
        self.time_offset_ns
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

    fn handle_subscriber(&self, sub: &Arc<dyn AnySubscriber>) {
        let entries = match sub.drain_all_stamped() {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!(
                    "time-ordered executor: subscriber {} cannot be drained: {err}",
                    sub.id_in_topic()
                );
                return;
            }
        };
        if entries.is_empty() {
            return;
        }
        let mut heap = self.heap.lock();
        for entry in entries {
            self.max_timestamp_seen.fetch_max(entry.timestamp_ns(), Ordering::AcqRel);
            heap.push(entry);
        }
    }

    fn cutoff(&self) -> u64 {
        if self.time_offset_ns == 0 {
            u64::MAX
        } else {
            self.max_timestamp_seen
                .load(Ordering::Acquire)
                .saturating_sub(self.time_offset_ns)
        }
    }

    /// Pops and invokes every heap entry whose timestamp is at or below
    /// the current cutoff, in non-decreasing timestamp order.
    fn process_ready_entries(&self) {
        let cutoff = self.cutoff();
        loop {
            let next = {
                let mut heap = self.heap.lock();
                match heap.peek() {
                    Some(top) if top.timestamp_ns() <= cutoff => heap.pop(),
                    _ => None,
                }
            };
            match next {
                Some(entry) => {
                    if catch_unwind(AssertUnwindSafe(|| entry.invoke())).is_err() {
                        log::error!("time-ordered executor: a callback panicked");
                    }
                }
                None => break,
            }
        }
    }

    /// Blocks, draining ready subscribers into the heap and releasing
    /// entries past the watermark, until [`Self::stop`] is called.
    pub fn spin(&self) {
        self.core.start_spinning();
        log::info!("time-ordered executor spinning, offset_ns={}", self.time_offset_ns);
        while self.core.is_spinning() {
            if let Some(sub) = self.core.wait_one_ready() {
                self.handle_subscriber(&sub);
            }
            self.process_ready_entries();
        }
        log::info!("time-ordered executor stopped");
    }

    /// One non-blocking turn.
    pub fn spin_some(&self) {
        while let Some(sub) = self.core.try_one_ready() {
            self.handle_subscriber(&sub);
        }
        self.process_ready_entries();
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

    /// Number of entries currently held in the heap, awaiting release.
    #[must_use]
    pub fn pending_size(&self) -> usize {
        self.heap.lock().len()
    }
}

impl ReadyQueueSink for TimeOrderedExecutor {
    fn enqueue_ready(&self, sub: Arc<dyn AnySubscriber>) {
        self.core.push_ready(sub);
    }
}
