use std::num::NonZeroUsize;
use std::time::Duration;

use config::shared::RunnerConfig;
use handoff::catalog::service::ProductService;
use handoff::concurrency::cancel::CallContext;
use handoff::error::ErrorKind;
use handoff::runner::pool::WorkerPool;
use handoff::store::memory::MemoryStore;
use handoff::test_utils::fixtures::{TEST_CATEGORY, product_request};
use handoff::test_utils::store::TestStoreWrapper;
use telemetry::tracing::init_test_tracing;

async fn slow_service(lookup_delay: Duration) -> ProductService<TestStoreWrapper<MemoryStore>> {
    let store = TestStoreWrapper::wrap(MemoryStore::with_categories([TEST_CATEGORY]).await);
    store.set_lookup_delay(lookup_delay).await;
    let pool = WorkerPool::with_size(NonZeroUsize::MIN, NonZeroUsize::MIN);

    ProductService::new(store, pool, &RunnerConfig::default())
}

#[tokio::test(start_paused = true)]
async fn cancelling_during_lookup_stops_before_persisting() {
    init_test_tracing();

    let service = slow_service(Duration::from_secs(10)).await;
    let (ctx, cancel) = CallContext::background().with_cancel();

    let rx = service.create_product_async(&ctx, product_request("LATE-1", TEST_CATEGORY));
    service.store().wait_for_lookup().await;
    cancel.cancel();

    let err = rx.recv(&CallContext::background()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(err.is_aborted());
    assert_eq!(service.store().persist_calls().await, 0);
    assert_eq!(service.store().wrapped().product_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn deadline_during_lookup_reports_deadline_exceeded() {
    init_test_tracing();

    let service = slow_service(Duration::from_secs(10)).await;
    let ctx = CallContext::background().with_timeout(Duration::from_millis(200));

    let err = service
        .create_product(&ctx, product_request("LATE-2", TEST_CATEGORY))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    assert_eq!(service.store().persist_calls().await, 0);
}

#[tokio::test(start_paused = true)]
async fn configured_call_timeout_bounds_every_call() {
    init_test_tracing();

    let store = TestStoreWrapper::wrap(MemoryStore::with_categories([TEST_CATEGORY]).await);
    store.set_lookup_delay(Duration::from_secs(10)).await;
    let config = RunnerConfig {
        call_timeout_ms: Some(100),
        ..RunnerConfig::default()
    };
    let pool = WorkerPool::new(&config);
    let service = ProductService::new(store, pool, &config);
    let ctx = CallContext::background();

    let pooled = service
        .create_product_pooled(&ctx, product_request("LATE-3", TEST_CATEGORY))
        .await
        .recv(&ctx)
        .await;
    let transactional = service
        .create_product_tx(&ctx, product_request("LATE-4", TEST_CATEGORY))
        .await;

    assert_eq!(pooled.unwrap_err().kind(), ErrorKind::DeadlineExceeded);
    assert_eq!(transactional.unwrap_err().kind(), ErrorKind::DeadlineExceeded);
    assert_eq!(service.store().wrapped().product_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn abandoned_wait_stops_the_unit_before_persisting() {
    init_test_tracing();

    let service = slow_service(Duration::from_secs(1)).await;
    let ctx = CallContext::background();

    let spawned = service.create_product_async(&ctx, product_request("ORPHAN-1", TEST_CATEGORY));
    let pooled = service
        .create_product_pooled(&ctx, product_request("ORPHAN-2", TEST_CATEGORY))
        .await;

    let wait_ctx = ctx.with_timeout(Duration::from_millis(10));
    assert_eq!(
        spawned.recv(&wait_ctx).await.unwrap_err().kind(),
        ErrorKind::DeadlineExceeded
    );
    assert_eq!(
        pooled.recv(&wait_ctx).await.unwrap_err().kind(),
        ErrorKind::DeadlineExceeded
    );

    // Long enough for both lookups to have finished had the units kept running.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(service.store().persist_calls().await, 0);
    assert_eq!(service.store().wrapped().product_count().await, 0);
}
