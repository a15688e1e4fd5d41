//! Exact counting under concurrent increments.
//!
//! Two ways of counting from many tasks at once: a shared counter behind a mutex that is only
//! held for the increment, or one private accumulator per task whose totals are reduced through
//! the tasks' outcome channels.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::concurrency::cancel::CallContext;
use crate::concurrency::group::TaskGroup;
use crate::error::HandoffResult;
use crate::runner::single::run_async;

/// Counter shared between tasks.
#[derive(Debug, Clone, Default)]
pub struct SharedTally {
    count: Arc<Mutex<u64>>,
}

impl SharedTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to the counter.
    pub async fn increment(&self) {
        self.add(1).await;
    }

    /// Adds `amount` to the counter.
    pub async fn add(&self, amount: u64) {
        let mut count = self.count.lock().await;
        *count += amount;
    }

    /// Returns the current count.
    pub async fn value(&self) -> u64 {
        *self.count.lock().await
    }
}

/// Counts `tasks * increments` through one [`SharedTally`] updated by every task.
pub async fn tally_shared(tasks: usize, increments: u64) -> HandoffResult<u64> {
    let tally = SharedTally::new();
    let mut group = TaskGroup::new();

    for _ in 0..tasks {
        let tally = tally.clone();
        group.spawn(async move {
            for _ in 0..increments {
                tally.increment().await;
            }

            Ok(())
        });
    }

    group.wait().await?;
    let total = tally.value().await;
    debug!(tasks, total, "shared tally completed");

    Ok(total)
}

/// Counts `tasks * increments` with one accumulator per task, summed from their outcomes.
pub async fn tally_owned(tasks: usize, increments: u64) -> HandoffResult<u64> {
    let receivers: Vec<_> = (0..tasks)
        .map(|_| {
            run_async(move || async move {
                let mut count = 0u64;
                for _ in 0..increments {
                    count += 1;
                    tokio::task::yield_now().await;
                }

                Ok(count)
            })
        })
        .collect();

    let ctx = CallContext::background();
    let mut total = 0;
    for rx in receivers {
        total += rx.recv(&ctx).await?;
    }
    debug!(tasks, total, "owned tally completed");

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_tally_is_exact() {
        let total = tally_shared(50, 200).await.unwrap();

        assert_eq!(total, 10_000);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_owned_tally_is_exact() {
        let total = tally_owned(50, 200).await.unwrap();

        assert_eq!(total, 10_000);
    }

    #[tokio::test]
    async fn test_no_tasks_counts_nothing() {
        assert_eq!(tally_shared(0, 10).await.unwrap(), 0);
        assert_eq!(tally_owned(0, 10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_accumulates() {
        let tally = SharedTally::new();
        tally.add(5).await;
        tally.increment().await;

        assert_eq!(tally.value().await, 6);
    }
}
