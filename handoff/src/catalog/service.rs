use std::time::Duration;

use chrono::Utc;
use config::shared::RunnerConfig;
use futures::FutureExt;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bail;
use crate::catalog::request::ProductCreateRequest;
use crate::catalog::types::{NewProduct, Product};
use crate::concurrency::cancel::CallContext;
use crate::concurrency::outcome::OutcomeRx;
use crate::error::{ErrorKind, HandoffResult};
use crate::runner::execute;
use crate::runner::pool::WorkerPool;
use crate::runner::single::run_async;
use crate::store::base::{CategoryStore, ProductStore, ProductTransaction};
use crate::transaction::{TransactionSource, run_in_transaction};

/// Creates products through every call shape.
///
/// All shapes run the same unit of work: validate the request, resolve its category, then
/// persist the product. A missing category fails with [`ErrorKind::DependencyNotFound`] before
/// anything is written, and the same fault yields the same [`ErrorKind`] whichever shape is used.
///
/// When a call timeout is configured, every call derives a deadline from it on top of the
/// caller's own context; the earlier deadline wins.
#[derive(Debug, Clone)]
pub struct ProductService<S> {
    store: S,
    pool: WorkerPool,
    call_timeout: Option<Duration>,
}

impl<S> ProductService<S>
where
    S: CategoryStore + ProductStore + Clone + 'static,
{
    /// Creates a service over `store`, running pooled calls on `pool`.
    pub fn new(store: S, pool: WorkerPool, config: &RunnerConfig) -> Self {
        Self {
            store,
            pool,
            call_timeout: config.call_timeout(),
        }
    }

    /// Returns the store the service writes to.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the worker pool used by [`ProductService::create_product_pooled`].
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Creates a product on the calling task.
    pub async fn create_product(
        &self,
        ctx: &CallContext,
        request: ProductCreateRequest,
    ) -> HandoffResult<Product> {
        let store = self.store.clone();
        let ctx = self.call_context(ctx);

        execute(move || create_product_unit(store, ctx, request)).await
    }

    /// Creates a product on a new background task.
    ///
    /// Returns immediately; the outcome is read from the returned receiver.
    pub fn create_product_async(
        &self,
        ctx: &CallContext,
        request: ProductCreateRequest,
    ) -> OutcomeRx<Product> {
        let store = self.store.clone();
        let ctx = self.call_context(ctx);

        run_async(move || create_product_unit(store, ctx, request))
    }

    /// Creates a product on the shared worker pool.
    ///
    /// Waits for room in the pool's queue, bounded by `ctx`, then returns the outcome receiver.
    pub async fn create_product_pooled(
        &self,
        ctx: &CallContext,
        request: ProductCreateRequest,
    ) -> OutcomeRx<Product> {
        let store = self.store.clone();
        let ctx = self.call_context(ctx);
        let unit_ctx = ctx.clone();

        self.pool
            .submit(&ctx, move || create_product_unit(store, unit_ctx, request))
            .await
    }

    /// Reads a product back by id.
    pub async fn product_by_id(&self, ctx: &CallContext, id: Uuid) -> HandoffResult<Option<Product>> {
        let ctx = self.call_context(ctx);

        ctx.run(self.store.product_by_id(id)).await?
    }

    fn call_context(&self, ctx: &CallContext) -> CallContext {
        match self.call_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx.clone(),
        }
    }
}

impl<S> ProductService<S>
where
    S: CategoryStore + ProductStore + TransactionSource + Clone + 'static,
    S::Tx: ProductTransaction,
{
    /// Creates a product inside a transaction.
    ///
    /// The product is only visible once the transaction commits; on any failure nothing is.
    pub async fn create_product_tx(
        &self,
        ctx: &CallContext,
        request: ProductCreateRequest,
    ) -> HandoffResult<Product> {
        let mut products = self.create_products_tx(ctx, vec![request]).await?;

        match products.pop() {
            Some(product) => Ok(product),
            None => bail!(
                ErrorKind::InvalidState,
                "Transaction committed without producing a product"
            ),
        }
    }

    /// Creates several products in one transaction.
    ///
    /// Either every product is persisted or, if any request fails, none is.
    pub async fn create_products_tx(
        &self,
        ctx: &CallContext,
        requests: Vec<ProductCreateRequest>,
    ) -> HandoffResult<Vec<Product>> {
        let store = self.store.clone();
        let ctx = self.call_context(ctx);
        let unit_ctx = ctx.clone();
        let count = requests.len();

        let products = run_in_transaction(&ctx, &self.store, move |tx| {
            async move {
                let mut products = Vec::with_capacity(requests.len());
                for request in requests {
                    let new_product = prepare_product(&store, &unit_ctx, &request).await?;
                    products.push(unit_ctx.run(tx.persist_product(new_product)).await??);
                }

                Ok(products)
            }
            .boxed()
        })
        .await?;

        info!(count, "products created in transaction");

        Ok(products)
    }
}

/// The unit of work shared by every non-transactional call shape.
async fn create_product_unit<S>(
    store: S,
    ctx: CallContext,
    request: ProductCreateRequest,
) -> HandoffResult<Product>
where
    S: CategoryStore + ProductStore,
{
    let new_product = prepare_product(&store, &ctx, &request).await?;

    // An autocommit write cannot be taken back, so the context is only checked before it starts.
    ctx.check()?;
    let product = store.persist_product(new_product).await?;

    info!(product_id = %product.id, sku = %product.sku, "product created");

    Ok(product)
}

/// Validates the request and resolves its category, producing the record to persist.
async fn prepare_product<S>(
    store: &S,
    ctx: &CallContext,
    request: &ProductCreateRequest,
) -> HandoffResult<NewProduct>
where
    S: CategoryStore,
{
    request.validate()?;

    let Some(category) = ctx.run(store.category_by_name(&request.category)).await?? else {
        debug!(category = %request.category, "category not found");
        bail!(
            ErrorKind::DependencyNotFound,
            "Category not found",
            detail = request.category.clone()
        );
    };

    Ok(NewProduct::from_request(request, &category, Utc::now()))
}
