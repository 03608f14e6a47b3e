// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Compile-time defaults and small overridable config bundles.
//!
//! Most call sites use the `DEFAULT_*` constants directly; callers that
//! need non-default sizing construct a [`QueueConfig`] or
//! [`SeqOrderedConfig`] and pass it explicitly.

/// Default capacity of a subscriber's bounded queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default bound on how many entries a sequence-ordered executor turn
/// drains from a single subscriber before moving to the next.
pub const DEFAULT_MAX_DRAIN_PER_SUBSCRIBER: usize = 256;

/// Default reorder-ring capacity. Must be a power of two.
pub const DEFAULT_RING_CAPACITY: usize = 65536;

/// Default time-ordered executor offset (nanoseconds). Zero means
/// "release everything immediately", i.e. no jitter absorption.
pub const DEFAULT_TIME_OFFSET_NS: u64 = 0;

/// Default number of worker threads in a multi-threaded executor's pool.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;

/// Per-subscriber queue sizing.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    /// Capacity of the bounded queue. Must be non-zero.
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Sequence-ordered executor sizing.
#[derive(Debug, Clone, Copy)]
pub struct SeqOrderedConfig {
    /// Power-of-two ring capacity.
    pub ring_capacity: usize,
    /// Bounded drain size per subscriber per turn.
    pub max_drain_per_subscriber: usize,
}

impl Default for SeqOrderedConfig {
    fn default() -> Self {
        Self {
            ring_capacity: DEFAULT_RING_CAPACITY,
            max_drain_per_subscriber: DEFAULT_MAX_DRAIN_PER_SUBSCRIBER,
        }
    }
}

/// Time-ordered executor sizing.
#[derive(Debug, Clone, Copy)]
pub struct TimeOrderedConfig {
    /// Bounded-lateness watermark offset, in nanoseconds.
    pub time_offset_ns: u64,
}

impl Default for TimeOrderedConfig {
    fn default() -> Self {
        Self {
            time_offset_ns: DEFAULT_TIME_OFFSET_NS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        assert!(QueueConfig::default().capacity > 0);
        assert!(SeqOrderedConfig::default().ring_capacity.is_power_of_two());
        assert_eq!(TimeOrderedConfig::default().time_offset_ns, 0);
    }
}
