use std::future::Future;

use crate::concurrency::outcome::{Outcome, OutcomeRx, outcome_channel};
use crate::runner::execute_into;

/// Launches `unit` on a new background task and returns the receiving end of its outcome.
///
/// The task publishes exactly one outcome. If the caller drops the receiver first the unit is
/// abandoned at its next suspension point.
pub fn run_async<T, F, Fut>(unit: F) -> OutcomeRx<T>
where
    T: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Outcome<T>> + Send + 'static,
{
    let (tx, rx) = outcome_channel();

    tokio::spawn(execute_into(unit, tx));

    rx
}
