//! Deferred task scheduling.
//!
//! Connections never call listeners from inside a transport callback.
//! Every event dispatch is handed to a [`Scheduler`] and runs on a later
//! turn, after the state change that caused it is already visible.
//!
//! Implementations must run tasks in submission order (FIFO).
//!
//! | Scheduler | Use |
//! |-----------|-----|
//! | [`TokioScheduler`] | Single worker task on a tokio runtime |
//! | [`ManualScheduler`] | Caller-driven queue for deterministic tests |

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

// ============================================================================
// Scheduler
// ============================================================================

/// Runs tasks on a later turn, in submission order.
pub trait Scheduler: Send + Sync {
    /// Queues `task` behind every previously deferred task.
    fn defer(&self, task: Task);
}

// ============================================================================
// TokioScheduler
// ============================================================================

/// Scheduler backed by one worker task on a tokio runtime.
///
/// A single worker drains an unbounded channel, which keeps tasks FIFO even
/// on a multi-threaded runtime. The worker exits once every clone of the
/// scheduler is dropped.
#[derive(Clone)]
pub struct TokioScheduler {
    task_tx: mpsc::UnboundedSender<Task>,
}

impl TokioScheduler {
    /// Creates a scheduler on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scheduler`] when called outside a tokio runtime.
    pub fn new() -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| Error::scheduler(e.to_string()))?;
        Ok(Self::with_handle(&handle))
    }

    /// Creates a scheduler whose worker runs on `handle`.
    #[must_use]
    pub fn with_handle(handle: &Handle) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        handle.spawn(Self::run_worker(task_rx));
        Self { task_tx }
    }

    async fn run_worker(mut task_rx: mpsc::UnboundedReceiver<Task>) {
        while let Some(task) = task_rx.recv().await {
            if catch_unwind(AssertUnwindSafe(task)).is_err() {
                error!("Deferred task panicked");
            }
        }

        debug!("Scheduler worker terminated");
    }
}

impl Scheduler for TokioScheduler {
    fn defer(&self, task: Task) {
        if self.task_tx.send(task).is_err() {
            warn!("Scheduler worker stopped, dropping task");
        }
    }
}

// ============================================================================
// ManualScheduler
// ============================================================================

/// Scheduler that only runs tasks when told to.
///
/// # Example
///
/// ```
/// use request_connection::{ManualScheduler, Scheduler};
///
/// let scheduler = ManualScheduler::new();
/// scheduler.defer(Box::new(|| println!("later")));
/// assert_eq!(scheduler.pending(), 1);
/// assert_eq!(scheduler.run_until_idle(), 1);
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    queue: Mutex<VecDeque<Task>>,
}

impl ManualScheduler {
    /// Creates an empty scheduler.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of queued tasks.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Runs the oldest queued task. Returns `false` if the queue was empty.
    pub fn run_next(&self) -> bool {
        // Released before running: the task may defer more work.
        let task = self.queue.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until the queue is empty, including tasks queued while
    /// running. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn defer(&self, task: Task) {
        self.queue.lock().push_back(task);
    }
}

// ============================================================================
// Tests
// ============================================================================
