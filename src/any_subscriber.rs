// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased subscriber view used by callback groups and executors.
//!
//! Callback groups and executors are generic over *which* executor policy
//! is in play, not over the message type `T` each subscriber carries —
//! they hold `Arc<dyn AnySubscriber>` and never see `T` again. This is the
//! Rust substitute for the original's `SubscriberBase` virtual interface.

use crate::callback_group::CallbackGroupKind;
use crate::error::Result;
use crate::exec_entry::{ExecEntry, TimeExecEntry};

/// Operations an executor or callback group needs on a subscriber without
/// knowing its message type.
pub trait AnySubscriber: Send + Sync {
    /// The subscriber's id within its topic; used for membership
    /// bookkeeping and test assertions, not for dispatch.
    fn id_in_topic(&self) -> u64;

    /// The subscriber's callback group's scheduling policy.
    fn callback_group_kind(&self) -> CallbackGroupKind;

    /// Whether this subscriber's message type carries the stamped
    /// capability (was constructed via `Subscriber::new_stamped`).
    fn is_stamped(&self) -> bool;

    /// Pops and synchronously invokes every currently queued item, then
    /// clears `ready`; re-notifies if items arrived during the drain.
    fn take_all(&self);

    /// Moves up to `max` queued items out as [`ExecEntry`] values, clears
    /// `ready`, and re-notifies if residual items remain. Available
    /// regardless of stamped capability.
    fn drain_exec_some(&self, max: usize) -> Vec<ExecEntry>;

    /// Moves every queued item out as [`TimeExecEntry`] values. Requires
    /// the stamped capability; returns `Err(Error::NotStamped)` otherwise.
    fn drain_all_stamped(&self) -> Result<Vec<TimeExecEntry>>;
}
