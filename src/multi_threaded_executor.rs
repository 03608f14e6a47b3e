// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Multi-threaded (thread-pool) executor.
//!
//! Mutually-exclusive subscribers run inline on the dispatcher thread —
//! cheaper than scheduling and, since the dispatcher only ever processes
//! one subscriber at a time, sufficient to keep "at most one of this
//! group's subscribers executing at a time" true across the whole
//! executor. Reentrant subscribers are handed to the worker pool and may
//! run concurrently with anything else.

use crate::any_subscriber::AnySubscriber;
use crate::callback_group::{CallbackGroupKind, ReadyQueueSink};
use crate::config::DEFAULT_WORKER_POOL_SIZE;
use crate::executor_base::ExecutorCore;
use crate::node::Node;
use crate::thread_pool::ThreadPool;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Dispatches ready subscribers to a fixed worker pool, running
/// mutually-exclusive subscribers inline on the dispatcher thread instead.
pub struct MultiThreadedExecutor {
    core: ExecutorCore,
    pool: Mutex<Option<ThreadPool>>,
}

impl MultiThreadedExecutor {
    /// Creates an executor with a pool of `worker_count` threads.
    #[must_use]
    pub fn new(worker_count: usize) -> Arc<Self> {
        Arc::new(Self {
            core: ExecutorCore::new(),
            pool: Mutex::new(Some(ThreadPool::new(worker_count))),
        })
    }

    /// Creates an executor with the crate's default worker-pool size.
    #[must_use]
    pub fn with_default_pool() -> Arc<Self> {
        Self::new(DEFAULT_WORKER_POOL_SIZE)
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

    fn run_take_all(sub: &Arc<dyn AnySubscriber>) {
        if catch_unwind(AssertUnwindSafe(|| sub.take_all())).is_err() {
            log::error!("subscriber {} callback panicked during take_all", sub.id_in_topic());
        }
    }

    fn handle_subscriber(&self, sub: Arc<dyn AnySubscriber>) {
        match sub.callback_group_kind() {
            CallbackGroupKind::MutuallyExclusive => Self::run_take_all(&sub),
            CallbackGroupKind::Reentrant => {
                let guard = self.pool.lock();
                if let Some(pool) = guard.as_ref() {
                    pool.submit(move || Self::run_take_all(&sub));
                } else {
                    log::warn!("dropping ready reentrant subscriber: pool already closed");
                }
            }
        }
    }

    /// Blocks, dispatching ready subscribers, until [`Self::stop`] is
    /// called.
    pub fn spin(&self) {
        self.core.start_spinning();
        log::info!("multi-threaded executor spinning");
        while self.core.is_spinning() {
            if let Some(sub) = self.core.wait_one_ready() {
                self.handle_subscriber(sub);
            }
        }
        log::info!("multi-threaded executor stopped");
    }

    /// One non-blocking turn.
    pub fn spin_some(&self) {
        while let Some(sub) = self.core.try_one_ready() {
            self.handle_subscriber(sub);
        }
    }

    /// Cooperative shutdown. Clears spinning, wakes the dispatcher, and
    /// closes the worker pool; outstanding tasks complete before this
    /// call returns. Idempotent — a second call finds the pool already
    /// gone and simply returns.
    pub fn stop(&self) {
        self.core.stop();
        let pool = self.pool.lock().take();
        drop(pool);
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
}

impl ReadyQueueSink for MultiThreadedExecutor {
    fn enqueue_ready(&self, sub: Arc<dyn AnySubscriber>) {
        self.core.push_ready(sub);
    }
}
