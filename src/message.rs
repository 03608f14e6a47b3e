// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared message plumbing: the stamped capability and the ordered item
//! subscribers queue.
//!
//! A published value becomes an `Arc<T>` the moment it enters a topic's
//! fan-out; every subscriber that observes it holds its own clone of that
//! `Arc` until its callback returns, and the last clone to drop frees the
//! value. `Arc` already gives the "loan from a shared pool, return to the
//! allocator on last drop" semantics by construction, so no separate pool
//! type is needed here.

use std::sync::Arc;

/// Marker capability for message types that embed their own nanosecond
/// timestamp. Required to construct a [`crate::subscriber::Subscriber`]
/// via `new_stamped`, and in turn to run that subscriber under a
/// time-ordered executor.
pub trait Stamped {
    /// The message's embedded timestamp, in nanoseconds.
    fn timestamp_ns(&self) -> u64;
}

/// One item in a subscriber's queue: a shared message paired with the
/// stamp it was enqueued with. The stamp is either a subscriber-local
/// monotonic counter (non-stamped types) or the message's own
/// `timestamp_ns` (stamped types, see [`Stamped`]).
pub struct OrderedItem<T> {
    pub(crate) stamp: u64,
    pub(crate) msg: Arc<T>,
}

impl<T> OrderedItem<T> {
    pub(crate) fn new(stamp: u64, msg: Arc<T>) -> Self {
        Self { stamp, msg }
    }

    /// The sequence stamp or timestamp this item was enqueued with.
    #[must_use]
    pub fn stamp(&self) -> u64 {
        self.stamp
    }

    /// The shared message payload.
    #[must_use]
    pub fn message(&self) -> &Arc<T> {
        &self.msg
    }
}

impl<T> Clone for OrderedItem<T> {
    fn clone(&self) -> Self {
        Self {
            stamp: self.stamp,
            msg: self.msg.clone(),
        }
    }
}
