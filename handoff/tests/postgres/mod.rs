#![cfg(all(feature = "test-utils", feature = "postgres-tests"))]

use std::num::NonZeroUsize;

use config::shared::{PgConnectionConfig, RunnerConfig};
use handoff::catalog::service::ProductService;
use handoff::concurrency::cancel::CallContext;
use handoff::error::ErrorKind;
use handoff::runner::pool::WorkerPool;
use handoff::store::postgres::PostgresStore;
use handoff::test_utils::fixtures::{MISSING_CATEGORY, TEST_CATEGORY, product_request};
use postgres::categories::upsert_category;
use postgres::migrations::migrate_catalog;
use postgres::products::read_product_by_sku;
use postgres::test_utils::{create_pg_database, drop_pg_database, test_connection_config};
use telemetry::tracing::init_test_tracing;

struct TestDatabase {
    config: PgConnectionConfig,
    service: ProductService<PostgresStore>,
}

impl TestDatabase {
    async fn spawn() -> Self {
        init_test_tracing();

        let config = test_connection_config();
        let pool = create_pg_database(&config).await;
        migrate_catalog(&pool).await.unwrap();
        upsert_category(&pool, TEST_CATEGORY).await.unwrap();

        let workers = WorkerPool::with_size(
            NonZeroUsize::new(2).unwrap(),
            NonZeroUsize::new(2).unwrap(),
        );
        let service = ProductService::new(PostgresStore::new(pool), workers, &RunnerConfig::default());

        Self { config, service }
    }

    async fn cleanup(self) {
        self.service.store().pool().close().await;
        drop_pg_database(&self.config).await;
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn products_are_persisted_through_every_shape() {
    let database = TestDatabase::spawn().await;
    let service = &database.service;
    let ctx = CallContext::background();

    let inline = service
        .create_product(&ctx, product_request("PG-1", TEST_CATEGORY))
        .await
        .unwrap();
    let spawned = service
        .create_product_async(&ctx, product_request("PG-2", TEST_CATEGORY))
        .recv(&ctx)
        .await
        .unwrap();
    let pooled = service
        .create_product_pooled(&ctx, product_request("PG-3", TEST_CATEGORY))
        .await
        .recv(&ctx)
        .await
        .unwrap();
    let transactional = service
        .create_product_tx(&ctx, product_request("PG-4", TEST_CATEGORY))
        .await
        .unwrap();

    for product in [inline, spawned, pooled, transactional] {
        let stored = service.product_by_id(&ctx, product.id).await.unwrap().unwrap();
        assert!(stored.same_fields(&product));
        assert_eq!(stored.category, TEST_CATEGORY);
    }

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_category_and_duplicate_sku_are_classified() {
    let database = TestDatabase::spawn().await;
    let service = &database.service;
    let ctx = CallContext::background();

    let err = service
        .create_product(&ctx, product_request("PG-5", MISSING_CATEGORY))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DependencyNotFound);

    service
        .create_product(&ctx, product_request("PG-6", TEST_CATEGORY))
        .await
        .unwrap();
    let err = service
        .create_product_tx(&ctx, product_request("PG-6", TEST_CATEGORY))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    database.cleanup().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_batch_is_rolled_back() {
    let database = TestDatabase::spawn().await;
    let service = &database.service;

    let err = service
        .create_products_tx(
            &CallContext::background(),
            vec![
                product_request("PG-7", TEST_CATEGORY),
                product_request("PG-8", MISSING_CATEGORY),
            ],
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyNotFound);
    let leaked = read_product_by_sku(service.store().pool(), "PG-7")
        .await
        .unwrap();
    assert!(leaked.is_none());

    database.cleanup().await;
}
