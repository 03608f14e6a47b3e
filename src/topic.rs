// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-name/type meeting point carrying the current publisher and
//! subscriber sets, with lock-free fan-out on publish.
//!
//! The subscriber list is the one place in this crate where readers vastly
//! outnumber writers, so it is stored behind a single atomic pointer to an
//! immutable `Vec` rather than behind a mutex: [`arc_swap::ArcSwap`] gives
//! wait-free reads and a CAS-retry-bounded read-copy-update path for
//! add/remove, which is exactly the copy-on-write array the component
//! design calls for.
//!
//! The list holds `Weak` references, not `Arc`s: a subscriber is owned by
//! whoever holds its handle (typically the node/user), and itself holds a
//! strong handle back to its topic (see [`crate::subscriber::Subscriber`]).
//! Topic -> Subscriber strong and Subscriber -> Topic strong would be an
//! unbreakable cycle; keeping the topic's side weak breaks it, matching
//! the "back-edges are never ownership edges" design note.

use crate::subscriber::Subscriber;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// A named, typed meeting point. Publishers and subscribers bind to a
/// `Topic<T>` by name through [`crate::domain::Domain::create_or_get_topic`].
pub struct Topic<T> {
    name: String,
    id: u64,
    subscribers: ArcSwap<Vec<Weak<Subscriber<T>>>>,
    next_sub_id: AtomicUsize,
    next_pub_id: AtomicUsize,
    publisher_count: AtomicUsize,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub(crate) fn new(name: String, id: u64) -> Self {
        Self {
            name,
            id,
            subscribers: ArcSwap::from_pointee(Vec::new()),
            next_sub_id: AtomicUsize::new(0),
            next_pub_id: AtomicUsize::new(0),
            publisher_count: AtomicUsize::new(0),
        }
    }

    /// The topic's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The topic's stable id within its owning domain.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn next_subscriber_id(&self) -> u64 {
        self.next_sub_id.fetch_add(1, Ordering::Relaxed) as u64
    }

    pub(crate) fn next_publisher_id(&self) -> u64 {
        self.next_pub_id.fetch_add(1, Ordering::Relaxed) as u64
    }

    pub(crate) fn register_publisher(&self) {
        self.publisher_count.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn unregister_publisher(&self) {
        self.publisher_count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Adds `sub` to the current subscriber set. Read-copy-update: clone
    /// the current `Vec`, push, and swap the pointer; `rcu` retries the
    /// whole closure on CAS failure so the result always reflects the
    /// current generation plus this insertion.
    pub(crate) fn add_subscriber(&self, sub: &Arc<Subscriber<T>>) {
        let weak = Arc::downgrade(sub);
        self.subscribers.rcu(|current| {
            let mut next: Vec<Weak<Subscriber<T>>> =
                current.iter().filter(|w| w.strong_count() > 0).cloned().collect();
            next.push(weak.clone());
            next
        });
    }

    /// Removes the subscriber with the given topic-local id, if present.
    pub(crate) fn remove_subscriber(&self, sub_id: u64) {
        self.subscribers.rcu(|current| {
            current
                .iter()
                .filter(|w| {
                    w.strong_count() > 0
                        && w.upgrade().map(|s| s.id_in_topic() != sub_id).unwrap_or(false)
                })
                .cloned()
                .collect::<Vec<_>>()
        });
    }

    /// Current number of live subscribers bound to this topic.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.load().iter().filter(|w| w.strong_count() > 0).count()
    }

    /// Synchronous fan-out: loads the current subscriber snapshot once and
    /// pushes the message into every still-live subscriber's queue. A
    /// subscriber added after this load either does not appear in the
    /// snapshot (and so misses the message) or was already present (and
    /// receives it) — never a torn intermediate.
    pub(crate) fn publish(&self, value: T) {
        self.publish_shared(Arc::new(value));
    }

    pub(crate) fn publish_shared(&self, shared: Arc<T>) {
        let snapshot = self.subscribers.load();
        for weak in snapshot.iter() {
            if let Some(sub) = weak.upgrade() {
                sub.deliver(shared.clone());
            }
        }
    }
}
