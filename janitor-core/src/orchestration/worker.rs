//! Bounded queue of validation jobs drained by a fixed set of workers.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use janitor_model::ScanResult;

use crate::error::PoolError;

/// Runs the full decision procedure for one file.
#[async_trait]
pub trait FileProcessor: Send + Sync {
    async fn process(&self, path: &str) -> ScanResult;
}

type JobOutcome = Result<ScanResult, PoolError>;

struct Job {
    path: String,
    ticket: Option<oneshot::Sender<JobOutcome>>,
}

/// Completion handle for a submitted job.
#[derive(Debug)]
pub struct JobTicket {
    path: String,
    rx: oneshot::Receiver<JobOutcome>,
}

impl JobTicket {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Waits for the job. A job dropped at shutdown resolves to `PoolError::Dropped`.
    pub async fn wait(self) -> JobOutcome {
        self.rx.await.unwrap_or(Err(PoolError::Dropped))
    }
}

/// Fixed-size worker pool fed by a bounded queue of paths.
pub struct ValidationPool {
    tx: mpsc::Sender<Job>,
    shutdown: CancellationToken,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    capacity: usize,
}

impl fmt::Debug for ValidationPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPool")
            .field("workers", &self.worker_count)
            .field("capacity", &self.capacity)
            .field("pending", &self.pending())
            .field("shut_down", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl ValidationPool {
    /// Spawns `workers` tasks on the current runtime. Both sizes are
    /// raised to at least one.
    pub fn spawn(
        processor: Arc<dyn FileProcessor>,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let workers = workers.max(1);
        let capacity = capacity.max(1);
        let (tx, rx) = mpsc::channel::<Job>(capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let shutdown = CancellationToken::new();

        let handles = (0..workers)
            .map(|i| {
                let worker_id = format!("validator-w{i}");
                let rx = Arc::clone(&rx);
                let processor = Arc::clone(&processor);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    loop {
                        let job = tokio::select! {
                            _ = shutdown.cancelled() => break,
                            job = async { rx.lock().await.recv().await } => job,
                        };
                        let Some(job) = job else { break };
                        run_job(&worker_id, processor.as_ref(), job).await;
                    }
                    debug!(worker = %worker_id, "validation worker stopped");
                })
            })
            .collect();

        info!(workers, capacity, "validation pool started");
        Self {
            tx,
            shutdown,
            workers: Mutex::new(handles),
            worker_count: workers,
            capacity,
        }
    }

    /// Queues a path without waiting for the result. The outcome is still
    /// logged by the worker that handles it.
    pub fn submit(&self, path: impl Into<String>) -> Result<(), PoolError> {
        self.try_enqueue(Job {
            path: path.into(),
            ticket: None,
        })
    }

    /// Queues a path and returns a ticket that resolves with its result.
    pub fn submit_with_ticket(
        &self,
        path: impl Into<String>,
    ) -> Result<JobTicket, PoolError> {
        let path = path.into();
        let (ticket_tx, rx) = oneshot::channel();
        self.try_enqueue(Job {
            path: path.clone(),
            ticket: Some(ticket_tx),
        })?;
        Ok(JobTicket { path, rx })
    }

    /// Like `submit_with_ticket` but waits for queue capacity.
    pub async fn enqueue(&self, path: impl Into<String>) -> Result<JobTicket, PoolError> {
        if self.shutdown.is_cancelled() {
            return Err(PoolError::Closed);
        }
        let path = path.into();
        let (ticket_tx, rx) = oneshot::channel();
        self.tx
            .send(Job {
                path: path.clone(),
                ticket: Some(ticket_tx),
            })
            .await
            .map_err(|_| PoolError::Closed)?;
        Ok(JobTicket { path, rx })
    }

    fn try_enqueue(&self, job: Job) -> Result<(), PoolError> {
        if self.shutdown.is_cancelled() {
            return Err(PoolError::Closed);
        }
        self.tx.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => PoolError::Full,
            mpsc::error::TrySendError::Closed(_) => PoolError::Closed,
        })
    }

    /// Jobs queued but not yet picked up.
    pub fn pending(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Stops accepting work and waits for workers to finish their current
    /// job. Jobs still queued are dropped and their tickets resolve to
    /// `PoolError::Dropped`.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handles: Vec<_> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "validation worker ended abnormally");
            }
        }
        info!("validation pool stopped");
    }
}

async fn run_job(worker_id: &str, processor: &dyn FileProcessor, job: Job) {
    let Job { path, ticket } = job;
    debug!(worker = %worker_id, path = %path, "validation job started");

    let outcome = AssertUnwindSafe(processor.process(&path))
        .catch_unwind()
        .await
        .map_err(|payload| PoolError::Panicked(panic_message(payload.as_ref())));

    match &outcome {
        Ok(result) => debug!(
            worker = %worker_id,
            path = %path,
            disposition = %result.disposition,
            "validation job finished"
        ),
        Err(err) => error!(worker = %worker_id, path = %path, error = %err, "validation job failed"),
    }

    if let Some(ticket) = ticket {
        // Receiver may have stopped waiting.
        let _ = ticket.send(outcome);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use janitor_model::Disposition;

    use super::*;

    #[derive(Default)]
    struct CountingProcessor {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl FileProcessor for CountingProcessor {
        async fn process(&self, path: &str) -> ScanResult {
            if path.contains("panic") {
                panic!("boom on {path}");
            }
            self.seen.fetch_add(1, Ordering::SeqCst);
            let mut result = ScanResult::skipped(path, "test");
            result.disposition = Disposition::Valid;
            result
        }
    }

    struct BlockingProcessor;

    #[async_trait]
    impl FileProcessor for BlockingProcessor {
        async fn process(&self, path: &str) -> ScanResult {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            ScanResult::skipped(path, "never")
        }
    }

    #[tokio::test]
    async fn tickets_resolve_with_results() {
        let processor = Arc::new(CountingProcessor::default());
        let pool = ValidationPool::spawn(processor.clone(), 2, 8);

        let tickets: Vec<_> = (0..5)
            .map(|i| pool.submit_with_ticket(format!("/m/{i}.mkv")).unwrap())
            .collect();
        for ticket in tickets {
            let path = ticket.path().to_string();
            let result = ticket.wait().await.unwrap();
            assert_eq!(result.file_path, path);
            assert_eq!(result.disposition, Disposition::Valid);
        }
        assert_eq!(processor.seen.load(Ordering::SeqCst), 5);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn panics_are_reported_and_workers_survive() {
        let pool = ValidationPool::spawn(Arc::new(CountingProcessor::default()), 1, 4);

        let bad = pool.submit_with_ticket("/m/panic.mkv").unwrap();
        match bad.wait().await {
            Err(PoolError::Panicked(message)) => assert!(message.contains("boom")),
            other => panic!("expected panic error, got {other:?}"),
        }

        let good = pool.submit_with_ticket("/m/ok.mkv").unwrap();
        assert!(good.wait().await.is_ok());
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn full_queue_rejects_submissions() {
        let pool = ValidationPool::spawn(Arc::new(BlockingProcessor), 1, 1);
        pool.submit("/m/a.mkv").unwrap();
        // Let the worker pick up the first job so the queue slot frees.
        tokio::time::sleep(Duration::from_millis(50)).await;
        pool.submit("/m/b.mkv").unwrap();
        assert_eq!(pool.submit("/m/c.mkv"), Err(PoolError::Full));
    }

    #[tokio::test]
    async fn closed_pool_rejects_submissions() {
        let pool = ValidationPool::spawn(Arc::new(CountingProcessor::default()), 1, 1);
        pool.shutdown().await;
        assert_eq!(pool.submit("/m/a.mkv"), Err(PoolError::Closed));
        assert!(matches!(pool.enqueue("/m/b.mkv").await, Err(PoolError::Closed)));
    }
}
