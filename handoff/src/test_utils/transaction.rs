use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{ErrorKind, HandoffResult};
use crate::handoff_error;
use crate::transaction::{Transaction, TransactionSource};

/// Something that happened to a [`ScriptedTransactionSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionEvent {
    Begin,
    Write(String),
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<TransactionEvent>,
    committed: Vec<String>,
    fail_begin: bool,
    fail_commit: bool,
    fail_rollback: bool,
    begin_delay: Option<Duration>,
}

/// Transaction source whose begin, commit and rollback can be made to fail.
///
/// Records every event and keeps the writes of committed transactions, so tests can check that
/// a transaction was either fully applied or not applied at all.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransactionSource {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedTransactionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes [`TransactionSource::begin`] fail with [`ErrorKind::Unavailable`].
    pub fn fail_begin(self) -> Self {
        self.with_inner(|inner| inner.fail_begin = true);
        self
    }

    /// Makes [`Transaction::commit`] fail with [`ErrorKind::Unavailable`].
    pub fn fail_commit(self) -> Self {
        self.with_inner(|inner| inner.fail_commit = true);
        self
    }

    /// Makes [`Transaction::rollback`] fail with [`ErrorKind::Unavailable`].
    pub fn fail_rollback(self) -> Self {
        self.with_inner(|inner| inner.fail_rollback = true);
        self
    }

    /// Delays every [`TransactionSource::begin`] by `delay`, as a pool with no free connection
    /// would.
    pub fn begin_delay(self, delay: Duration) -> Self {
        self.with_inner(|inner| inner.begin_delay = Some(delay));
        self
    }

    /// Returns every recorded event in order.
    pub fn events(&self) -> Vec<TransactionEvent> {
        self.with_inner(|inner| inner.events.clone())
    }

    /// Returns the writes of every committed transaction.
    pub fn committed(&self) -> Vec<String> {
        self.with_inner(|inner| inner.committed.clone())
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        // A test that panicked while holding the lock already failed.
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };

        f(&mut inner)
    }
}

impl TransactionSource for ScriptedTransactionSource {
    type Tx = ScriptedTransaction;

    async fn begin(&self) -> HandoffResult<ScriptedTransaction> {
        let (fail, delay) = self.with_inner(|inner| {
            inner.events.push(TransactionEvent::Begin);
            (inner.fail_begin, inner.begin_delay)
        });
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(handoff_error!(
                ErrorKind::Unavailable,
                "Injected begin failure"
            ));
        }

        Ok(ScriptedTransaction {
            source: self.clone(),
            staged: Vec::new(),
        })
    }
}

/// Transaction opened from a [`ScriptedTransactionSource`].
#[derive(Debug)]
pub struct ScriptedTransaction {
    source: ScriptedTransactionSource,
    staged: Vec<String>,
}

impl ScriptedTransaction {
    /// Stages a write that becomes visible through [`ScriptedTransactionSource::committed`] on
    /// commit.
    pub fn write(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.source
            .with_inner(|inner| inner.events.push(TransactionEvent::Write(value.clone())));
        self.staged.push(value);
    }
}

impl Transaction for ScriptedTransaction {
    async fn commit(self) -> HandoffResult<()> {
        let ScriptedTransaction { source, staged } = self;
        let fail = source.with_inner(|inner| {
            inner.events.push(TransactionEvent::Commit);
            if !inner.fail_commit {
                inner.committed.extend(staged);
            }
            inner.fail_commit
        });

        if fail {
            return Err(handoff_error!(
                ErrorKind::Unavailable,
                "Injected commit failure"
            ));
        }

        Ok(())
    }

    async fn rollback(self) -> HandoffResult<()> {
        let fail = self.source.with_inner(|inner| {
            inner.events.push(TransactionEvent::Rollback);
            inner.fail_rollback
        });

        if fail {
            return Err(handoff_error!(
                ErrorKind::Unavailable,
                "Injected rollback failure"
            ));
        }

        Ok(())
    }
}
