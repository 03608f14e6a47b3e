// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! Every fallible operation in this crate returns `Result<T>`. All other
//! invariant violations (double registration, destruction-order bugs,
//! allocation exhaustion) are programmer errors and abort the process
//! rather than returning a value here.

use std::fmt;

/// Errors produced by the registry, topic, publisher/subscriber and
/// executor machinery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // === Lookup / binding errors ===
    /// A topic name is being bound with a different type than its live
    /// instance was created with.
    TypeMismatch,
    /// The topic a publisher or subscriber tried to bind to was destroyed
    /// before the bind completed.
    TopicClosed,

    // === Executor errors ===
    /// The time-ordered executor was handed a subscriber whose message
    /// type does not carry the stamped capability.
    NotStamped,
    /// The executor was asked to wait while stopped, or stopped while a
    /// consumer was waiting; the consumer exits cleanly on this error.
    Shutdown,

    // === Queue / reorder diagnostics ===
    /// A subscriber's bounded queue was full; the oldest entry was
    /// dropped to make room. Never blocks the publisher.
    QueueOverflow {
        /// Total number of items dropped by this subscriber so far.
        dropped: u64,
    },
    /// The sequence-ordered reorder buffer's ring rejected an entry and
    /// the hashmap fallback's window grew past the configured threshold.
    /// Diagnostic only; the executor keeps running.
    ReorderWindowExceeded {
        /// The sequence number that triggered the diagnostic.
        seq: u64,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch => write!(f, "topic name bound with a different type tag"),
            Error::TopicClosed => write!(f, "topic was closed before bind completed"),
            Error::NotStamped => write!(f, "subscriber's message type lacks the stamped capability"),
            Error::Shutdown => write!(f, "executor stopped while a consumer was waiting"),
            Error::QueueOverflow { dropped } => {
                write!(f, "subscriber queue overflowed, {dropped} item(s) dropped so far")
            }
            Error::ReorderWindowExceeded { seq } => {
                write!(f, "reorder window exceeded at sequence {seq}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
