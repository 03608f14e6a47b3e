// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared ready-queue/semaphore plumbing common to all four executor
//! policies.
//!
//! Each concrete executor (single-threaded, multi-threaded, time-ordered,
//! sequence-ordered) embeds an [`ExecutorCore`] and implements its own
//! `handle_subscriber`. The core owns the node-membership bookkeeping, the
//! MPMC ready queue (`crossbeam::channel`, unbounded — back-pressure for
//! this queue is bounded indirectly by each subscriber's own bounded
//! queue), and the counting [`Semaphore`] that bounds how long a consumer
//! sleeps between ready-queue polls.

use crate::any_subscriber::AnySubscriber;
use crate::callback_group::ReadyQueueSink;
use crate::node::Node;
use crate::sync::Semaphore;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long a consumer blocks on the ready queue before re-checking the
/// `spinning` flag during cooperative shutdown.
pub const WAIT_TIMEOUT: Duration = Duration::from_millis(100);

/// Ready-queue plus semaphore plumbing shared by every executor policy.
pub struct ExecutorCore {
    nodes: Mutex<Vec<Arc<Node>>>,
    ready_tx: Sender<Arc<dyn AnySubscriber>>,
    ready_rx: Receiver<Arc<dyn AnySubscriber>>,
    semaphore: Semaphore,
    spinning: AtomicBool,
}

impl ExecutorCore {
    #[must_use]
    pub fn new() -> Self {
        let (ready_tx, ready_rx) = channel::unbounded();
        Self {
            nodes: Mutex::new(Vec::new()),
            ready_tx,
            ready_rx,
            semaphore: Semaphore::new(),
            spinning: AtomicBool::new(false),
        }
    }

    /// Registers `node` with this executor and binds its default callback
    /// group's notifications to this executor's ready queue.
    pub fn add_node(&self, node: &Arc<Node>, sink: &Arc<dyn ReadyQueueSink>) {
        node.default_callback_group().bind_executor(sink);
        self.nodes.lock().push(node.clone());
    }

    /// Drops `node` from this executor's membership and unbinds its
    /// default callback group.
    pub fn remove_node(&self, node: &Arc<Node>) {
        node.default_callback_group().unbind_executor();
        self.nodes.lock().retain(|n| n.id() != node.id());
    }

    /// Number of nodes currently registered with this executor.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Enqueues `sub` and releases one semaphore permit. Called by
    /// [`ReadyQueueSink::enqueue_ready`] implementations.
    pub fn push_ready(&self, sub: Arc<dyn AnySubscriber>) {
        let _ = self.ready_tx.send(sub);
        self.semaphore.release();
    }

    /// Blocks (with a bounded timeout so shutdown stays cooperative) until
    /// one subscriber is available, or returns `None` if none arrived
    /// before the timeout.
    pub fn wait_one_ready(&self) -> Option<Arc<dyn AnySubscriber>> {
        if !self.semaphore.acquire_timeout(WAIT_TIMEOUT) {
            return None;
        }
        self.ready_rx.try_recv().ok()
    }

    /// Non-blocking: returns a ready subscriber only if one is already
    /// queued.
    pub fn try_one_ready(&self) -> Option<Arc<dyn AnySubscriber>> {
        if !self.semaphore.try_acquire() {
            return None;
        }
        self.ready_rx.try_recv().ok()
    }

    /// Marks the executor as spinning. Idempotent.
    pub fn start_spinning(&self) {
        self.spinning.store(true, Ordering::Release);
    }

    /// Whether the executor is currently spinning.
    #[must_use]
    pub fn is_spinning(&self) -> bool {
        self.spinning.load(Ordering::Acquire)
    }

    /// Cooperative shutdown: clears `spinning` and releases the semaphore
    /// once so a blocked consumer wakes up and observes the cleared flag.
    /// Idempotent — may be called any number of times.
    pub fn stop(&self) {
        self.spinning.store(false, Ordering::Release);
        self.semaphore.release();
    }

    /// Releases the semaphore once without enqueueing anything, for
    /// callers that want to nudge a blocked consumer (e.g. after binding a
    /// new node mid-spin).
    pub fn wakeup(&self) {
        self.semaphore.release();
    }
}

impl Default for ExecutorCore {
    fn default() -> Self {
        Self::new()
    }
}
