//! Bounded worker pool that fans records out and outcomes back in.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use crate::fallback::{ProbeOutcome, ServerRecord};
use crate::probe::ProbeExecutor;

type WorkQueue = Arc<Mutex<mpsc::Receiver<ServerRecord>>>;

/// Distributes records across a fixed number of workers.
pub struct Dispatcher {
    executor: Arc<ProbeExecutor>,
    workers: usize,
}

impl Dispatcher {
    /// Create a dispatcher. A worker count of zero is treated as one.
    pub fn new(executor: Arc<ProbeExecutor>, workers: usize) -> Self {
        Self {
            executor,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start probing `records` and return the outcome stream.
    ///
    /// The stream yields exactly one outcome per record, in completion
    /// order, and ends once every worker has drained the queue.
    pub fn dispatch(
        &self,
        records: Vec<ServerRecord>,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<ProbeOutcome> {
        let total = records.len();
        let (work_tx, work_rx) = mpsc::channel(total.max(1));
        for record in records {
            // Capacity equals the record count, so this never fails.
            if let Err(e) = work_tx.try_send(record) {
                tracing::error!(error = %e, "Work queue rejected a record");
            }
        }
        drop(work_tx);

        let queue: WorkQueue = Arc::new(Mutex::new(work_rx));
        let (result_tx, result_rx) = mpsc::channel(self.workers);
        let tested = Arc::new(AtomicUsize::new(0));

        tracing::info!(workers = self.workers, fallbacks = total, "Spawning workers");

        let mut set = JoinSet::new();
        for worker_id in 1..=self.workers {
            set.spawn(run_worker(
                worker_id,
                queue.clone(),
                self.executor.clone(),
                result_tx.clone(),
                cancel.clone(),
                tested.clone(),
                total,
            ));
        }
        // Workers hold the only senders now; the stream closes when they return.
        drop(result_tx);

        tokio::spawn(async move {
            let start = Instant::now();
            while let Some(joined) = set.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Worker terminated abnormally");
                }
            }
            tracing::info!(
                tested = tested.load(Ordering::Relaxed),
                total,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "All workers finished"
            );
        });

        result_rx
    }
}

async fn run_worker(
    worker_id: usize,
    queue: WorkQueue,
    executor: Arc<ProbeExecutor>,
    results: mpsc::Sender<ProbeOutcome>,
    cancel: CancellationToken,
    tested: Arc<AtomicUsize>,
    total: usize,
) {
    loop {
        // Hold the lock only for the dequeue, never across a probe.
        let next = queue.lock().await.recv().await;
        let Some(record) = next else {
            break;
        };

        let outcome = executor.probe(&record, worker_id, &cancel).await;
        if results.send(outcome).await.is_err() {
            tracing::warn!(worker = worker_id, "Outcome receiver dropped, stopping worker");
            break;
        }

        let count = tested.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(worker = worker_id, "Tested {} / {}", count, total);
    }

    tracing::trace!(worker = worker_id, "Worker exiting");
}
