// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fixed-size worker pool used by [`crate::multi_threaded_executor`].
//!
//! Plain `std::thread::spawn` workers pulling from a shared
//! `crossbeam::channel`, the same shape the teacher crate uses for its
//! I/O threads (e.g. `transport::tcp::io_thread`) rather than reaching for
//! an external thread-pool crate.

use crossbeam::channel::{self, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// A fixed-size pool of worker threads draining one shared task queue.
pub struct ThreadPool {
    tx: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawns `size` worker threads (minimum 1).
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (tx, rx) = channel::unbounded::<Task>();
        let mut workers = Vec::with_capacity(size);
        for idx in 0..size {
            let rx = rx.clone();
            workers.push(
                std::thread::Builder::new()
                    .name(format!("corebus-worker-{idx}"))
                    .spawn(move || {
                        while let Ok(task) = rx.recv() {
                            if catch_unwind(AssertUnwindSafe(task)).is_err() {
                                log::error!("corebus worker thread caught a panicking task");
                            }
                        }
                    })
                    .expect("failed to spawn corebus worker thread"),
            );
        }
        Self { tx: Some(tx), workers }
    }

    /// Submits `task` to the pool. A no-op once the pool has been closed.
    pub fn submit(&self, task: impl FnOnce() + Send + 'static) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Box::new(task));
        }
    }
}

impl Drop for ThreadPool {
    /// Closes the task channel (unblocking every worker's `recv`) and
    /// joins all workers, so outstanding tasks complete before `drop`
    /// returns.
    fn drop(&mut self) {
        self.tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}
