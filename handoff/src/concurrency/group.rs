use std::future::Future;

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::concurrency::cancel::{CallContext, CancelHandle};
use crate::error::{ErrorKind, HandoffResult};
use crate::handoff_error;

/// Group of fallible tasks that are awaited together.
///
/// [`TaskGroup::wait`] joins every task and returns either `Ok(())` or the aggregate of all
/// failures, panics included. A group created with [`TaskGroup::with_context`] also cancels its
/// context on the first failure it observes, so siblings running under that context stop early.
#[derive(Debug, Default)]
pub struct TaskGroup {
    join_set: JoinSet<HandoffResult<()>>,
    cancel: Option<CancelHandle>,
}

impl TaskGroup {
    /// Creates an empty group with no associated context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty group and a child of `parent` that is cancelled on the first failure.
    pub fn with_context(parent: &CallContext) -> (Self, CallContext) {
        let (ctx, cancel) = parent.with_cancel();
        let group = Self {
            join_set: JoinSet::new(),
            cancel: Some(cancel),
        };

        (group, ctx)
    }

    /// Spawns a task into the group.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = HandoffResult<()>> + Send + 'static,
    {
        self.join_set.spawn(future);
    }

    /// Returns the number of tasks that have not been joined yet.
    pub fn len(&self) -> usize {
        self.join_set.len()
    }

    /// Returns `true` when the group has no pending tasks.
    pub fn is_empty(&self) -> bool {
        self.join_set.is_empty()
    }

    /// Waits for every task and aggregates their failures.
    pub async fn wait(mut self) -> HandoffResult<()> {
        let mut errors = Vec::new();

        while let Some(result) = self.join_set.join_next().await {
            let failure = match result {
                Ok(Ok(())) => None,
                Ok(Err(err)) => {
                    error!(error = %err, "task in group failed");
                    Some(err)
                }
                Err(join_err) if join_err.is_cancelled() => {
                    debug!("task in group was cancelled");
                    None
                }
                Err(join_err) => Some(handoff_error!(
                    ErrorKind::WorkerPanic,
                    "Task in group panicked",
                    join_err
                )),
            };

            if let Some(err) = failure {
                if let Some(cancel) = self.cancel.as_ref().filter(|_| errors.is_empty()) {
                    cancel.cancel();
                }
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}
