//! Transactional coordinator.
//!
//! [`run_in_transaction`] begins a transaction, hands it to a unit of work and then commits or
//! rolls back depending on the unit's result. Writes made through the transaction are either all
//! durable or none are.

use std::future::Future;

use futures::future::BoxFuture;
use tracing::{debug, error};

use crate::concurrency::cancel::CallContext;
use crate::error::{ErrorKind, HandoffError, HandoffResult};
use crate::handoff_error;

/// An open transaction.
pub trait Transaction: Send {
    /// Makes every write performed through this transaction durable and visible.
    fn commit(self) -> impl Future<Output = HandoffResult<()>> + Send;

    /// Discards every write performed through this transaction.
    fn rollback(self) -> impl Future<Output = HandoffResult<()>> + Send;
}

/// Something that can open transactions, usually a connection pool.
pub trait TransactionSource: Send + Sync {
    /// The transaction type produced by [`TransactionSource::begin`].
    type Tx: Transaction;

    /// Opens a new transaction.
    fn begin(&self) -> impl Future<Output = HandoffResult<Self::Tx>> + Send;
}

/// Runs `unit` inside a transaction opened from `source`.
///
/// - Opening the transaction is bounded by `ctx`. A failure or abort while beginning is returned
///   as is and `unit` is never invoked.
/// - When `unit` succeeds the transaction is committed; a commit failure is reported as
///   [`ErrorKind::CommitFailed`] with the driver error as its source.
/// - When `unit` fails the transaction is rolled back and the unit's error is returned. If the
///   rollback fails too, both are returned as an aggregate whose first member is the unit's
///   error, so [`HandoffError::kind`] still reports the original fault.
pub async fn run_in_transaction<S, T, F>(
    ctx: &CallContext,
    source: &S,
    unit: F,
) -> HandoffResult<T>
where
    S: TransactionSource,
    F: for<'a> FnOnce(&'a mut S::Tx) -> BoxFuture<'a, HandoffResult<T>>,
{
    let mut tx = ctx.run(source.begin()).await??;
    debug!("transaction started");

    let result = unit(&mut tx).await;
    match result {
        Ok(value) => {
            tx.commit().await.map_err(|err| {
                error!(error = %err, "transaction commit failed");
                handoff_error!(
                    ErrorKind::CommitFailed,
                    "Transaction commit failed",
                    detail = err.to_string(),
                    source: err
                )
            })?;
            debug!("transaction committed");

            Ok(value)
        }
        Err(unit_err) => match tx.rollback().await {
            Ok(()) => {
                debug!(error = %unit_err, "transaction rolled back");
                Err(unit_err)
            }
            Err(rollback_err) => {
                error!(
                    error = %unit_err,
                    rollback_error = %rollback_err,
                    "transaction rollback failed after unit failure"
                );
                let rollback_err = handoff_error!(
                    ErrorKind::RollbackFailed,
                    "Transaction rollback failed",
                    detail = rollback_err.to_string(),
                    source: rollback_err
                );

                Err(HandoffError::from(vec![unit_err, rollback_err]))
            }
        },
    }
}
