// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # corebus — an in-process publish/subscribe messaging core
//!
//! `corebus` is the runtime engine behind robotics/autonomy-style
//! programs where many producers and consumers exchange timestamped
//! sensor and control messages inside a single process. It provides the
//! registry/handle graph, the lock-free per-topic fan-out, the
//! ready-queue/semaphore signalling between subscribers and executors,
//! and four pluggable executor policies.
//!
//! ## Quick start
//!
//! ```
//! use corebus::{Domain, Node, NodeKind, Publisher, SingleThreadedExecutor, Subscriber};
//! use std::sync::atomic::{AtomicI32, Ordering};
//! use std::sync::Arc;
//!
//! let domain = Domain::new(1);
//! let node = Node::new("talker", &domain, NodeKind::Intraprocess);
//! let executor = SingleThreadedExecutor::new();
//! executor.add_node(&node);
//!
//! let total = Arc::new(AtomicI32::new(0));
//! let total2 = total.clone();
//! let _sub = Subscriber::new("/count", &node, move |v: Arc<i32>| {
//!     total2.fetch_add(*v, Ordering::SeqCst);
//! })
//! .unwrap();
//! let publisher = Publisher::<i32>::new("/count", &node).unwrap();
//!
//! publisher.publish(10);
//! publisher.publish(32);
//! executor.spin_some();
//! assert_eq!(total.load(Ordering::SeqCst), 42);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------+
//! |  Domain  ->  Topic (copy-on-write fan-out)  <-  Node        |
//! |                 |                         Publisher/Subscriber|
//! |                 v                                  |        |
//! |         Subscriber queue  --ready-->  CallbackGroup --notify-|
//! |                                              |               |
//! |                                              v               |
//! |                 Executor (single/multi/time/seq-ordered)     |
//! +-------------------------------------------------------------+
//! ```
//!
//! ## Modules overview
//!
//! - [`registry`] — generic ref-counted slot-table bookkeeping
//! - [`domain`] / [`node`] / [`topic`] — the registry/handle graph
//! - [`publisher`] / [`subscriber`] — typed send/receive ends
//! - [`callback_group`] — scheduling-unit membership and notification
//! - [`single_threaded_executor`], [`multi_threaded_executor`],
//!   [`time_ordered_executor`], [`seq_ordered_executor`] — the four
//!   executor policies
//! - [`reorder_buffer`] — ring + hashmap fallback used by the
//!   sequence-ordered executor
//! - [`error`] / [`config`] — crate-wide error type and compile-time
//!   defaults

// Clippy: No blanket suppressions beyond what Cargo.toml's `[lints.clippy]`
// table already allows. Fix issues properly or use inline #[allow] with
// justification.

pub mod any_subscriber;
pub mod callback_group;
pub mod config;
pub mod domain;
pub mod error;
pub mod exec_entry;
pub mod executor_base;
pub mod message;
pub mod multi_threaded_executor;
pub mod node;
pub mod publisher;
pub mod registry;
pub mod reorder_buffer;
pub mod seq_ordered_executor;
pub mod single_threaded_executor;
pub mod subscriber;
pub mod sync;
pub mod thread_pool;
pub mod time_ordered_executor;
pub mod topic;

pub use any_subscriber::AnySubscriber;
pub use callback_group::{CallbackGroup, CallbackGroupKind};
pub use domain::Domain;
pub use error::{Error, Result};
pub use message::Stamped;
pub use multi_threaded_executor::MultiThreadedExecutor;
pub use node::{Node, NodeKind};
pub use publisher::Publisher;
pub use reorder_buffer::{ReorderBuffer, ReorderStats};
pub use seq_ordered_executor::SeqOrderedExecutor;
pub use single_threaded_executor::SingleThreadedExecutor;
pub use subscriber::Subscriber;
pub use time_ordered_executor::TimeOrderedExecutor;
pub use topic::Topic;
