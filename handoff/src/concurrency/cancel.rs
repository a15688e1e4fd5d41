//! Cancellation and deadlines for blocking calls.
//!
//! A [`CallContext`] is handed to every call that may wait. It is cancelled through a
//! [`CancelHandle`] (backed by a watch channel, so every clone observes the same flag) and may
//! carry a deadline. Child contexts inherit the cancellation of their parent and can only tighten
//! the deadline.

use std::future::{Future, pending};
use std::sync::Arc;
use std::time::Duration;

use futures::future::select_all;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::concurrency::deadline::DeadlineElapsed;
use crate::error::{ErrorKind, HandoffError, HandoffResult};
use crate::handoff_error;

/// Cancels every [`CallContext`] derived from it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancels the associated contexts.
    ///
    /// Cancelling more than once has no further effect.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once [`CancelHandle::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Cancellation and deadline scope of a single call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancellations: Vec<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Returns a context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derives a child context that can additionally be cancelled through the returned handle.
    pub fn with_cancel(&self) -> (CallContext, CancelHandle) {
        let (tx, rx) = watch::channel(false);

        let mut child = self.clone();
        child.cancellations.push(rx);

        (child, CancelHandle { tx: Arc::new(tx) })
    }

    /// Derives a child context expiring at `deadline`, or at the parent's deadline if earlier.
    pub fn with_deadline(&self, deadline: Instant) -> CallContext {
        let mut child = self.clone();
        child.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });

        child
    }

    /// Derives a child context expiring `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> CallContext {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Returns the deadline of this context, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the time left before the deadline, if any.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` when this context or one of its ancestors has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellations.iter().any(|rx| *rx.borrow())
    }

    /// Returns an error when the context is already cancelled or past its deadline.
    pub fn check(&self) -> HandoffResult<()> {
        if self.is_cancelled() {
            return Err(cancelled_error());
        }

        if self
            .deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
        {
            return Err(deadline_error());
        }

        Ok(())
    }

    /// Drives `future` to completion unless the context is cancelled or its deadline passes first.
    ///
    /// On abort the future is dropped, so it never produces a late result.
    pub async fn run<F>(&self, future: F) -> HandoffResult<F::Output>
    where
        F: Future,
    {
        self.check()?;

        tokio::select! {
            biased;

            _ = self.cancelled() => Err(cancelled_error()),
            _ = DeadlineElapsed::new(self.deadline) => Err(deadline_error()),
            output = future => Ok(output),
        }
    }

    /// Resolves once the context is cancelled.
    ///
    /// Never resolves for contexts without a cancellation source, or whose handles were all
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        if self.cancellations.is_empty() {
            return pending().await;
        }

        let waits = self.cancellations.iter().cloned().map(|mut rx| {
            Box::pin(async move {
                let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
                if closed {
                    pending::<()>().await;
                }
            })
        });

        select_all(waits).await;
    }
}

fn cancelled_error() -> HandoffError {
    handoff_error!(ErrorKind::Cancelled, "Call was cancelled")
}

fn deadline_error() -> HandoffError {
    handoff_error!(ErrorKind::DeadlineExceeded, "Call deadline exceeded")
}
