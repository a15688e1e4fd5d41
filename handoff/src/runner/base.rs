use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error};

use crate::concurrency::outcome::{Outcome, OutcomeTx};
use crate::error::ErrorKind;
use crate::handoff_error;

/// Invokes a unit of work and drives it to completion.
///
/// A panic raised while invoking or polling the unit is contained and turned into an
/// [`ErrorKind::WorkerPanic`] outcome, so the receiving side never waits on a task that died.
pub async fn execute<T, F, Fut>(unit: F) -> Outcome<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    match AssertUnwindSafe(async move { unit().await })
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(panic = %message, "unit of work panicked");

            Err(handoff_error!(
                ErrorKind::WorkerPanic,
                "Unit of work panicked",
                message
            ))
        }
    }
}

/// Executes `unit` and publishes its outcome through `tx`.
///
/// The unit is dropped at its next suspension point if the receiver goes away first, so a caller
/// that stopped waiting never has work completed on its behalf.
pub(crate) async fn execute_into<T, F, Fut>(unit: F, mut tx: OutcomeTx<T>)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Outcome<T>>,
{
    let outcome = tokio::select! {
        biased;

        _ = tx.closed() => None,
        outcome = execute(unit) => Some(outcome),
    };

    match outcome {
        Some(outcome) => {
            tx.send(outcome);
        }
        None => debug!("outcome receiver dropped, unit of work abandoned"),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
