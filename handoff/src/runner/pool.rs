use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use config::shared::RunnerConfig;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::concurrency::cancel::CallContext;
use crate::concurrency::outcome::{Outcome, OutcomeRx, outcome_channel};
use crate::error::{ErrorKind, HandoffError, HandoffResult};
use crate::handoff_error;
use crate::runner::execute_into;

/// A queued job: the unit of work wrapped together with the sender of its outcome.
type Job = BoxFuture<'static, ()>;

/// Fixed set of workers pulling units of work from a bounded queue.
///
/// Each submission gets its own outcome channel, so no call can observe another call's result.
/// The queue holds at most `queue_capacity` jobs; [`WorkerPool::submit`] waits for room under the
/// caller's [`CallContext`]. After [`WorkerPool::shutdown`] queued jobs still drain and new
/// submissions resolve with [`ErrorKind::PoolClosed`].
///
/// Dropping the last handle without [`WorkerPool::wait`] aborts the workers; callers waiting on
/// queued jobs then observe [`ErrorKind::OutcomeLost`].
#[derive(Debug, Clone)]
pub struct WorkerPool {
    inner: Arc<WorkerPoolInner>,
}

#[derive(Debug)]
struct WorkerPoolInner {
    size: NonZeroUsize,
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<JoinSet<()>>,
}

impl WorkerPool {
    /// Starts a pool sized from `config`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: &RunnerConfig) -> Self {
        Self::with_size(config.pool_size(), config.queue_capacity())
    }

    /// Starts `size` workers sharing a queue of `queue_capacity` jobs.
    pub fn with_size(size: NonZeroUsize, queue_capacity: NonZeroUsize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(queue_capacity.get());
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = JoinSet::new();
        for worker_id in 0..size.get() {
            workers.spawn(worker_loop(worker_id, rx.clone()));
        }

        info!(
            pool_size = size.get(),
            queue_capacity = queue_capacity.get(),
            "worker pool started"
        );

        Self {
            inner: Arc::new(WorkerPoolInner {
                size,
                jobs: Mutex::new(Some(tx)),
                workers: Mutex::new(workers),
            }),
        }
    }

    /// Returns the number of workers.
    pub fn size(&self) -> NonZeroUsize {
        self.inner.size
    }

    /// Queues `unit` and returns the receiving end of its outcome.
    ///
    /// Waiting for queue room is bounded by `ctx`; an aborted or rejected submission is reported
    /// through the returned receiver so every call shape is consumed the same way.
    pub async fn submit<T, F, Fut>(&self, ctx: &CallContext, unit: F) -> OutcomeRx<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let Some(jobs) = self.inner.jobs.lock().await.clone() else {
            return OutcomeRx::ready(Err(pool_closed_error()));
        };

        let (tx, rx) = outcome_channel();
        let job: Job = Box::pin(execute_into(unit, tx));

        match ctx.run(jobs.send(job)).await {
            Ok(Ok(())) => {
                debug!("job queued on worker pool");
                rx
            }
            Ok(Err(_)) => OutcomeRx::ready(Err(pool_closed_error())),
            Err(err) => OutcomeRx::ready(Err(err)),
        }
    }

    /// Stops accepting new jobs.
    ///
    /// Jobs that are already queued keep running. Calling it again has no effect.
    pub async fn shutdown(&self) {
        if self.inner.jobs.lock().await.take().is_some() {
            info!("worker pool shutting down");
        }
    }

    /// Waits for every worker to exit.
    ///
    /// Workers exit once the queue is closed and drained, so this only returns after
    /// [`WorkerPool::shutdown`] has been called.
    pub async fn wait(&self) -> HandoffResult<()> {
        let mut errors = Vec::new();

        let mut workers = self.inner.workers.lock().await;
        while let Some(result) = workers.join_next().await {
            if let Err(join_err) = result {
                if join_err.is_cancelled() {
                    debug!("pool worker was cancelled");
                } else {
                    error!(error = %join_err, "pool worker panicked");
                    errors.push(handoff_error!(
                        ErrorKind::WorkerPanic,
                        "Pool worker panicked",
                        join_err
                    ));
                }
            }
        }

        if errors.is_empty() {
            info!("worker pool stopped");
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}

async fn worker_loop(worker_id: usize, jobs: Arc<Mutex<mpsc::Receiver<Job>>>) {
    debug!(worker_id, "pool worker started");

    loop {
        // The lock only guards the receiver; it is released before the job runs.
        let job = { jobs.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };

        job.await;
    }

    debug!(worker_id, "pool worker exited");
}

fn pool_closed_error() -> HandoffError {
    handoff_error!(ErrorKind::PoolClosed, "Worker pool is shut down")
}
