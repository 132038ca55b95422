//! Process-wide FIFO queue for fire-and-forget background work.
//!
//! The queue is an explicitly constructed instance with an owned lifecycle
//! (start, post, shutdown), injected wherever deferred work is posted —
//! never ambient global state. Posting enqueues in constant time and
//! returns; a small worker pool drains the queue for the lifetime of the
//! process. There is no durability: work accepted but not yet executed at
//! process death is lost, and anything that must survive a crash has to be
//! re-derivable from persisted state by an external reconciliation pass.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::domain::{Result, SlipwayError};
use crate::obs;

/// A queued unit of work: a zero-argument deferred async action.
pub type WorkItem = BoxFuture<'static, anyhow::Result<()>>;

/// Clonable post-side handle to a [`BackgroundWorkQueue`].
#[derive(Clone)]
pub struct WorkQueueHandle {
    tx: mpsc::UnboundedSender<WorkItem>,
}

impl WorkQueueHandle {
    /// Enqueue a deferred action. Returns immediately without waiting for
    /// execution; fails only once the owning queue has shut down.
    pub fn post<F>(&self, work: F) -> Result<()>
    where
        F: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.tx
            .send(Box::pin(work))
            .map_err(|_| SlipwayError::QueueClosed)
    }
}

impl std::fmt::Debug for WorkQueueHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueueHandle").finish()
    }
}

/// Ordered, best-effort, in-memory work queue drained by a worker pool.
///
/// Items are dequeued in post order. With more than one worker a slow item
/// delays only the worker running it; relative completion order across
/// workers is unspecified.
pub struct BackgroundWorkQueue {
    tx: mpsc::UnboundedSender<WorkItem>,
    workers: Vec<JoinHandle<()>>,
}

impl BackgroundWorkQueue {
    /// Start the queue with the given number of workers (minimum one).
    pub fn start(workers: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let rx = Arc::new(Mutex::new(rx));
        let workers = (0..workers.max(1))
            .map(|index| tokio::spawn(worker_loop(index, Arc::clone(&rx))))
            .collect();
        Self { tx, workers }
    }

    /// A clonable handle for posting work.
    pub fn handle(&self) -> WorkQueueHandle {
        WorkQueueHandle {
            tx: self.tx.clone(),
        }
    }

    /// Stop accepting work, drain items already accepted, and join the
    /// workers.
    pub async fn shutdown(self) {
        drop(self.tx);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

impl std::fmt::Debug for BackgroundWorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundWorkQueue")
            .field("workers", &self.workers.len())
            .finish()
    }
}

/// Worker loop: dequeue in FIFO order, run, log failures, never stop on a
/// failed or panicking item.
async fn worker_loop(worker: usize, rx: Arc<Mutex<mpsc::UnboundedReceiver<WorkItem>>>) {
    loop {
        // Hold the receiver lock only while dequeuing so other workers can
        // pick up the next item while this one executes.
        let item = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(item) = item else {
            break;
        };
        match AssertUnwindSafe(item).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => obs::emit_work_item_failed(&error),
            Err(_) => {
                tracing::error!(event = "work_queue.item_panicked", worker = worker);
            }
        }
    }
}
