//! Bounded worker pool for shard flushes and merges.
//!
//! Shard tasks are submitted by the ingesting thread and run by a fixed set
//! of threads in FIFO order. Submission never blocks: once `max_queue_depth`
//! shards are waiting the task is handed back, and the builder flushes that
//! shard itself. Closing the pool lets the queued shards finish and reports
//! how much work the threads did.

use parking_lot::{Condvar, Mutex};
use quarry_core::{Error, Result};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error};

/// A unit of work run on a pool thread.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The queue is full or the pool is closed; the task comes back to the caller.
pub struct Backpressure(pub Task);

impl std::fmt::Debug for Backpressure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Backpressure")
    }
}

/// Work done by the pool threads over the pool's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSummary {
    /// Tasks the threads ran to completion
    pub completed: u64,
    /// Tasks that panicked
    pub panicked: u64,
}

#[derive(Default)]
struct Shared {
    tasks: VecDeque<Task>,
    closed: bool,
    summary: PoolSummary,
}

struct Queue {
    shared: Mutex<Shared>,
    ready: Condvar,
    capacity: usize,
}

impl Queue {
    /// Next task, or `None` once the pool is closed and empty
    fn next(&self) -> Option<Task> {
        let mut shared = self.shared.lock();
        loop {
            if let Some(task) = shared.tasks.pop_front() {
                return Some(task);
            }
            if shared.closed {
                return None;
            }
            self.ready.wait(&mut shared);
        }
    }

    fn record(&self, panicked: bool) {
        let mut shared = self.shared.lock();
        if panicked {
            shared.summary.panicked += 1;
        } else {
            shared.summary.completed += 1;
        }
    }
}

/// Fixed-size FIFO thread pool.
pub struct WorkerPool {
    queue: Arc<Queue>,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `num_threads` workers named `quarry-worker-0`, `quarry-worker-1`, ...
    pub fn new(num_threads: usize, max_queue_depth: usize) -> Result<Self> {
        if num_threads == 0 {
            return Err(Error::Config("worker pool needs at least one thread".into()));
        }
        let mut pool = WorkerPool {
            queue: Arc::new(Queue {
                shared: Mutex::new(Shared::default()),
                ready: Condvar::new(),
                capacity: max_queue_depth,
            }),
            threads: Vec::with_capacity(num_threads),
        };
        for i in 0..num_threads {
            let queue = Arc::clone(&pool.queue);
            let spawned = std::thread::Builder::new()
                .name(format!("quarry-worker-{}", i))
                .spawn(move || run_worker(&queue));
            match spawned {
                Ok(handle) => pool.threads.push(handle),
                Err(e) => {
                    pool.close();
                    return Err(e.into());
                }
            }
        }
        debug!(target: "quarry::pool", threads = num_threads, capacity = max_queue_depth, "Started worker pool");
        Ok(pool)
    }

    /// Queue a task.
    pub fn submit(&self, work: impl FnOnce() + Send + 'static) -> std::result::Result<(), Backpressure> {
        let task: Task = Box::new(work);
        {
            let mut shared = self.queue.shared.lock();
            if shared.closed || shared.tasks.len() >= self.queue.capacity {
                return Err(Backpressure(task));
            }
            shared.tasks.push_back(task);
        }
        self.queue.ready.notify_one();
        Ok(())
    }

    /// Refuse new tasks, run the queued ones, and join the threads.
    pub fn close(&mut self) -> PoolSummary {
        self.queue.shared.lock().closed = true;
        self.queue.ready.notify_all();
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
        let summary = self.queue.shared.lock().summary;
        debug!(target: "quarry::pool", completed = summary.completed, panicked = summary.panicked, "Closed worker pool");
        summary
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker(queue: &Queue) {
    while let Some(task) = queue.next() {
        let outcome = catch_unwind(AssertUnwindSafe(task));
        if let Err(panic) = &outcome {
            let msg = panic
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("(non-string panic)");
            error!(target: "quarry::pool", panic = msg, "Worker task panicked");
        }
        queue.record(outcome.is_err());
    }
}
