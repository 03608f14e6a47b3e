// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scheduling unit that groups subscribers and routes their ready
//! notifications to a bound executor.
//!
//! A callback group does not itself schedule anything — it only
//! classifies its member subscribers as mutually exclusive or reentrant
//! (read by the multi-threaded executor) and forwards `notify` calls to
//! whichever executor it is currently bound to.

use crate::any_subscriber::AnySubscriber;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Scheduling policy for a callback group's member subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackGroupKind {
    /// At most one of this group's subscribers executes at a time, across
    /// any executor.
    MutuallyExclusive,
    /// This group's subscribers may execute concurrently.
    Reentrant,
}

/// Sink an executor exposes so callback groups can hand it ready
/// subscribers without the callback group module depending on the
/// executor module (which itself depends on `CallbackGroup`).
pub trait ReadyQueueSink: Send + Sync {
    /// Enqueues `sub` on the ready queue and signals the executor's
    /// semaphore exactly once per call.
    fn enqueue_ready(&self, sub: Arc<dyn AnySubscriber>);
}

static NEXT_GROUP_ID: AtomicU64 = AtomicU64::new(0);

/// A set of subscribers sharing a scheduling policy and an executor
/// binding.
pub struct CallbackGroup {
    id: u64,
    kind: CallbackGroupKind,
    members: Mutex<Vec<Weak<dyn AnySubscriber>>>,
    executor: Mutex<Option<Weak<dyn ReadyQueueSink>>>,
}

impl CallbackGroup {
    /// Creates a callback group not yet attached to any node. Nodes use
    /// this to build their default group and any extra groups requested
    /// via the public constructor.
    #[must_use]
    pub fn new_orphan(kind: CallbackGroupKind) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_GROUP_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            members: Mutex::new(Vec::new()),
            executor: Mutex::new(None),
        })
    }

    /// This group's stable id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// This group's scheduling policy.
    #[must_use]
    pub fn kind(&self) -> CallbackGroupKind {
        self.kind
    }

    /// Binds this group to an executor's ready queue. Replaces any
    /// previous binding.
    pub fn bind_executor(&self, sink: &Arc<dyn ReadyQueueSink>) {
        *self.executor.lock() = Some(Arc::downgrade(sink));
    }

    /// Clears this group's executor binding.
    pub fn unbind_executor(&self) {
        *self.executor.lock() = None;
    }

    pub(crate) fn add_member(&self, sub: &Arc<dyn AnySubscriber>) {
        let mut members = self.members.lock();
        members.retain(|w| w.strong_count() > 0);
        members.push(Arc::downgrade(sub));
    }

    pub(crate) fn remove_member(&self, sub_id: u64) {
        let mut members = self.members.lock();
        members.retain(|w| {
            w.upgrade().map(|s| s.id_in_topic() != sub_id).unwrap_or(false)
        });
    }

    /// Current number of live member subscribers.
    #[must_use]
    pub fn member_count(&self) -> usize {
        let mut members = self.members.lock();
        members.retain(|w| w.strong_count() > 0);
        members.len()
    }

    /// Forwards `sub` to the bound executor's ready queue. A no-op if no
    /// executor is currently bound (the subscriber simply stays ready
    /// until a `spin`/`spin_some` on some executor picks it up after a
    /// bind). Callers (subscribers) must only invoke this after winning
    /// the ready-flag's false->true transition themselves, which is what
    /// gives the at-most-one-notification-in-flight guarantee.
    pub fn notify(&self, sub: Arc<dyn AnySubscriber>) {
        let sink = self.executor.lock().as_ref().and_then(Weak::upgrade);
        if let Some(sink) = sink {
            sink.enqueue_ready(sub);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sink {
        seen: Mutex<Vec<u64>>,
    }

    impl ReadyQueueSink for Sink {
        fn enqueue_ready(&self, sub: Arc<dyn AnySubscriber>) {
            self.seen.lock().push(sub.id_in_topic());
        }
    }

    #[test]
    fn notify_without_bound_executor_is_a_no_op() {
        let group = CallbackGroup::new_orphan(CallbackGroupKind::Reentrant);
        // No executor bound; exercising this must not panic.
        struct DummySub;
        impl AnySubscriber for DummySub {
            fn id_in_topic(&self) -> u64 {
                1
            }
            fn callback_group_kind(&self) -> CallbackGroupKind {
                CallbackGroupKind::Reentrant
            }
            fn is_stamped(&self) -> bool {
                false
            }
            fn take_all(&self) {}
            fn drain_exec_some(&self, _max: usize) -> Vec<crate::exec_entry::ExecEntry> {
                Vec::new()
            }
            fn drain_all_stamped(&self) -> crate::error::Result<Vec<crate::exec_entry::TimeExecEntry>> {
                Ok(Vec::new())
            }
        }
        group.notify(Arc::new(DummySub));
    }

    #[test]
    fn notify_forwards_to_bound_executor() {
        let group = CallbackGroup::new_orphan(CallbackGroupKind::MutuallyExclusive);
        let sink_concrete = Arc::new(Sink { seen: Mutex::new(Vec::new()) });
        let sink: Arc<dyn ReadyQueueSink> = sink_concrete.clone();
        group.bind_executor(&sink);

        struct DummySub(u64);
        impl AnySubscriber for DummySub {
            fn id_in_topic(&self) -> u64 {
                self.0
            }
            fn callback_group_kind(&self) -> CallbackGroupKind {
                CallbackGroupKind::MutuallyExclusive
            }
            fn is_stamped(&self) -> bool {
                false
            }
            fn take_all(&self) {}
            fn drain_exec_some(&self, _max: usize) -> Vec<crate::exec_entry::ExecEntry> {
                Vec::new()
            }
            fn drain_all_stamped(&self) -> crate::error::Result<Vec<crate::exec_entry::TimeExecEntry>> {
                Ok(Vec::new())
            }
        }
        group.notify(Arc::new(DummySub(7)));

        assert_eq!(*sink_concrete.seen.lock(), vec![7]);
    }
}
