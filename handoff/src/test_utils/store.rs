use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use uuid::Uuid;

use crate::catalog::types::{Category, NewProduct, Product};
use crate::error::{ErrorKind, HandoffResult};
use crate::handoff_error;
use crate::store::base::{CategoryStore, ProductStore, ProductTransaction};
use crate::transaction::{Transaction, TransactionSource};

#[derive(Debug, Default)]
struct Inner {
    lookup_calls: u64,
    persist_calls: u64,
    lookup_delay: Option<Duration>,
    persist_failure: Option<ErrorKind>,
}

/// Test wrapper around a store that counts calls and injects delays and failures.
///
/// The wrapped store is called without holding the wrapper's lock, so concurrent calls reach it
/// concurrently.
#[derive(Debug, Clone)]
pub struct TestStoreWrapper<S> {
    wrapped_store: S,
    inner: Arc<RwLock<Inner>>,
    lookup_started: Arc<Notify>,
}

impl<S> TestStoreWrapper<S> {
    /// Wraps `store` with no delay and no injected failure.
    pub fn wrap(store: S) -> Self {
        Self {
            wrapped_store: store,
            inner: Arc::new(RwLock::new(Inner::default())),
            lookup_started: Arc::new(Notify::new()),
        }
    }

    /// Returns the wrapped store.
    pub fn wrapped(&self) -> &S {
        &self.wrapped_store
    }

    /// Delays every category lookup by `delay` before it reaches the wrapped store.
    pub async fn set_lookup_delay(&self, delay: Duration) {
        self.inner.write().await.lookup_delay = Some(delay);
    }

    /// Makes every persist fail with `kind`, or restores normal behavior with `None`.
    pub async fn set_persist_failure(&self, kind: Option<ErrorKind>) {
        self.inner.write().await.persist_failure = kind;
    }

    /// Waits until a category lookup has started.
    pub async fn wait_for_lookup(&self) {
        self.lookup_started.notified().await;
    }

    /// Number of category lookups performed so far.
    pub async fn lookup_calls(&self) -> u64 {
        self.inner.read().await.lookup_calls
    }

    /// Number of persist attempts so far, transactional ones included.
    pub async fn persist_calls(&self) -> u64 {
        self.inner.read().await.persist_calls
    }

    async fn before_persist(&self) -> HandoffResult<()> {
        let failure = {
            let mut inner = self.inner.write().await;
            inner.persist_calls += 1;
            inner.persist_failure
        };

        match failure {
            Some(kind) => Err(handoff_error!(kind, "Injected persist failure")),
            None => Ok(()),
        }
    }
}

impl<S> CategoryStore for TestStoreWrapper<S>
where
    S: CategoryStore,
{
    async fn category_by_name(&self, name: &str) -> HandoffResult<Option<Category>> {
        let delay = {
            let mut inner = self.inner.write().await;
            inner.lookup_calls += 1;
            inner.lookup_delay
        };
        self.lookup_started.notify_one();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.wrapped_store.category_by_name(name).await
    }
}

impl<S> ProductStore for TestStoreWrapper<S>
where
    S: ProductStore,
{
    async fn persist_product(&self, product: NewProduct) -> HandoffResult<Product> {
        self.before_persist().await?;

        self.wrapped_store.persist_product(product).await
    }

    async fn product_by_id(&self, id: Uuid) -> HandoffResult<Option<Product>> {
        self.wrapped_store.product_by_id(id).await
    }
}

impl<S> TransactionSource for TestStoreWrapper<S>
where
    S: TransactionSource + Clone,
    S::Tx: ProductTransaction,
{
    type Tx = TestTransaction<S>;

    async fn begin(&self) -> HandoffResult<Self::Tx> {
        let wrapped_tx = self.wrapped_store.begin().await?;

        Ok(TestTransaction {
            wrapper: self.clone(),
            wrapped_tx,
        })
    }
}

/// Transaction opened from a [`TestStoreWrapper`].
pub struct TestTransaction<S: TransactionSource> {
    wrapper: TestStoreWrapper<S>,
    wrapped_tx: S::Tx,
}

impl<S> Transaction for TestTransaction<S>
where
    S: TransactionSource + Clone,
    S::Tx: ProductTransaction,
{
    async fn commit(self) -> HandoffResult<()> {
        self.wrapped_tx.commit().await
    }

    async fn rollback(self) -> HandoffResult<()> {
        self.wrapped_tx.rollback().await
    }
}

impl<S> ProductTransaction for TestTransaction<S>
where
    S: TransactionSource + Clone,
    S::Tx: ProductTransaction,
{
    async fn persist_product(&mut self, product: NewProduct) -> HandoffResult<Product> {
        self.wrapper.before_persist().await?;

        self.wrapped_tx.persist_product(product).await
    }
}
