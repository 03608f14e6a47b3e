// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Single-threaded executor: drains every ready subscriber with
//! `take_all`, entirely on the caller's own thread.
//!
//! This is the simplest of the four policies and the natural default:
//! callbacks run on whichever thread called `spin`/`spin_some`, in
//! FIFO-enqueue order across subscribers, with no cross-subscriber
//! ordering guarantee. Back-pressure is entirely a function of how slow
//! the user's own callbacks are — a slow callback just lets its
//! subscriber's queue grow and re-notify.

use crate::any_subscriber::AnySubscriber;
use crate::callback_group::ReadyQueueSink;
use crate::executor_base::ExecutorCore;
use crate::node::Node;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Runs every ready subscriber's callbacks inline, one subscriber at a
/// time, on the thread that calls [`SingleThreadedExecutor::spin`].
pub struct SingleThreadedExecutor {
    core: ExecutorCore,
}

impl SingleThreadedExecutor {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            core: ExecutorCore::new(),
        })
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

    fn handle_subscriber(sub: &Arc<dyn AnySubscriber>) {
        if catch_unwind(AssertUnwindSafe(|| sub.take_all())).is_err() {
            log::error!("subscriber {} callback panicked during take_all", sub.id_in_topic());
        }
    }

    /// Blocks, dispatching ready subscribers, until [`Self::stop`] is
    /// called from another thread.
    pub fn spin(&self) {
        self.core.start_spinning();
        log::info!("single-threaded executor spinning");
        while self.core.is_spinning() {
            if let Some(sub) = self.core.wait_one_ready() {
                Self::handle_subscriber(&sub);
            }
        }
        log::info!("single-threaded executor stopped");
    }

    /// One non-blocking turn: dispatches every subscriber currently ready
    /// without blocking for more.
    pub fn spin_some(&self) {
        while let Some(sub) = self.core.try_one_ready() {
            Self::handle_subscriber(&sub);
        }
    }

    /// Cooperative shutdown; in-flight callbacks finish before `spin`
    /// returns.
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
}

impl ReadyQueueSink for SingleThreadedExecutor {
    fn enqueue_ready(&self, sub: Arc<dyn AnySubscriber>) {
        self.core.push_ready(sub);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::node::NodeKind;
    use crate::publisher::Publisher;
    use crate::subscriber::Subscriber;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn spin_some_drains_currently_ready_subscribers() {
        let domain = Domain::new(200);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let exec = SingleThreadedExecutor::new();
        exec.add_node(&node);

        let sum = Arc::new(AtomicI32::new(0));
        let sum2 = sum.clone();
        let _sub = Subscriber::new("/t", &node, move |v: Arc<i32>| {
            sum2.fetch_add(*v, Ordering::SeqCst);
        })
        .unwrap();
        let publisher = Publisher::<i32>::new("/t", &node).unwrap();

        publisher.publish(10);
        publisher.publish(20);
        publisher.publish(30);
        exec.spin_some();
        assert_eq!(sum.load(Ordering::SeqCst), 60);
    }

    #[test]
    fn spin_stops_cooperatively_from_another_thread() {
        let domain = Domain::new(201);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let exec = SingleThreadedExecutor::new();
        exec.add_node(&node);

        let exec2 = exec.clone();
        let handle = thread::spawn(move || exec2.spin());
        thread::sleep(Duration::from_millis(20));
        exec.stop();
        handle.join().expect("spin thread should not panic");
    }

    #[test]
    fn end_to_end_single_publisher_single_subscriber_scenario() {
        let domain = Domain::new(202);
        let node = Node::new("n", &domain, NodeKind::Intraprocess);
        let exec = SingleThreadedExecutor::new();
        exec.add_node(&node);

        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let _sub = Subscriber::new("/t", &node, move |v: Arc<i32>| {
            seen2.lock().push(*v);
        })
        .unwrap();
        let publisher = Publisher::<i32>::new("/t", &node).unwrap();

        let exec2 = exec.clone();
        let handle = thread::spawn(move || exec2.spin());
        publisher.publish(10);
        publisher.publish(20);
        publisher.publish(30);
        thread::sleep(Duration::from_millis(50));
        exec.stop();
        handle.join().expect("spin thread should not panic");

        assert_eq!(*seen.lock(), vec![10, 20, 30]);
    }
}
