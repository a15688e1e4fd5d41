//! Single-use outcome channel between a background task and the caller that launched it.

use tokio::sync::oneshot;
use tracing::debug;

use crate::concurrency::cancel::CallContext;
use crate::error::{ErrorKind, HandoffResult};
use crate::handoff_error;

/// Result of a unit of work: the produced value or the error that stopped it.
pub type Outcome<T> = HandoffResult<T>;

/// Creates a connected outcome sender and receiver.
pub fn outcome_channel<T>() -> (OutcomeTx<T>, OutcomeRx<T>) {
    let (tx, rx) = oneshot::channel();
    (OutcomeTx { tx }, OutcomeRx { rx })
}

/// Producer end of an outcome channel.
///
/// [`OutcomeTx::send`] consumes the sender, so at most one outcome is ever written. Dropping the
/// sender without sending makes the receiver resolve with [`ErrorKind::OutcomeLost`].
#[derive(Debug)]
pub struct OutcomeTx<T> {
    tx: oneshot::Sender<Outcome<T>>,
}

impl<T> OutcomeTx<T> {
    /// Publishes the outcome.
    ///
    /// Never waits. Returns `false` when the receiver is already gone, in which case the outcome
    /// is dropped.
    pub fn send(self, outcome: Outcome<T>) -> bool {
        match self.tx.send(outcome) {
            Ok(()) => true,
            Err(outcome) => {
                debug!(
                    succeeded = outcome.is_ok(),
                    "outcome receiver dropped before the outcome was delivered"
                );
                false
            }
        }
    }

    /// Returns `true` when the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the receiver has been dropped.
    ///
    /// A receiver is dropped when its caller stops waiting, for instance when
    /// [`OutcomeRx::recv`] gives up on its context.
    pub async fn closed(&mut self) {
        self.tx.closed().await
    }
}

/// Consumer end of an outcome channel.
#[derive(Debug)]
pub struct OutcomeRx<T> {
    rx: oneshot::Receiver<Outcome<T>>,
}

impl<T> OutcomeRx<T> {
    /// Returns a receiver that already holds `outcome`.
    ///
    /// Used when a call fails before any task is launched.
    pub fn ready(outcome: Outcome<T>) -> Self {
        let (tx, rx) = outcome_channel();
        tx.send(outcome);
        rx
    }

    /// Waits for the outcome, bounded by `ctx`.
    ///
    /// Resolves with [`ErrorKind::Cancelled`] or [`ErrorKind::DeadlineExceeded`] when the context
    /// aborts first, and with [`ErrorKind::OutcomeLost`] when the producer went away without
    /// writing.
    pub async fn recv(self, ctx: &CallContext) -> Outcome<T> {
        match ctx.run(self.rx).await? {
            Ok(outcome) => outcome,
            Err(_) => Err(handoff_error!(
                ErrorKind::OutcomeLost,
                "Producer exited without publishing an outcome"
            )),
        }
    }

    /// Returns the outcome if it has already been published, without waiting.
    pub fn try_recv(&mut self) -> Option<Outcome<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(handoff_error!(
                ErrorKind::OutcomeLost,
                "Producer exited without publishing an outcome"
            ))),
        }
    }
}
