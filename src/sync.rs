// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! A small counting semaphore used to signal the executor ready queue.
//!
//! Two-tier wakeup, same shape as a boolean wake notifier: an atomic
//! counter absorbs releases without taking the lock on the common path,
//! and a condvar handles the blocking-wait path. `release` increments the
//! count and notifies one waiter; `acquire`/`acquire_timeout` decrement
//! the count, blocking (with or without a deadline) while it is zero.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// A counting semaphore. Releases are allowed to accumulate past the
/// number of waiters; spurious wakeups with nothing to dequeue downstream
/// are expected and harmless (the ready queue is the source of truth, the
/// semaphore only bounds how long a consumer sleeps).
pub struct Semaphore {
    count: AtomicI64,
    gate: Mutex<()>,
    condvar: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with an initial count of zero.
    pub fn new() -> Self {
        Self {
            count: AtomicI64::new(0),
            gate: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    /// Releases one permit and wakes a single waiter.
    pub fn release(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
        let _guard = self.gate.lock();
        self.condvar.notify_one();
    }

    /// Acquires one permit, blocking indefinitely until one is available.
    pub fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }
            let mut guard = self.gate.lock();
            if self.count.load(Ordering::Acquire) > 0 {
                continue;
            }
            self.condvar.wait(&mut guard);
        }
    }

    /// Acquires one permit, blocking up to `timeout`. Returns `false` on
    /// timeout without having acquired a permit.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            if self.try_acquire() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let mut guard = self.gate.lock();
            if self.count.load(Ordering::Acquire) > 0 {
                continue;
            }
            let result = self.condvar.wait_for(&mut guard, remaining);
            if result.timed_out() && self.count.load(Ordering::Acquire) <= 0 {
                return false;
            }
        }
    }

    /// Non-blocking acquire attempt.
    pub fn try_acquire(&self) -> bool {
        let mut current = self.count.load(Ordering::Acquire);
        while current > 0 {
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
        false
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}
