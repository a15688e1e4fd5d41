use std::num::NonZeroUsize;
use std::time::Duration;

use config::shared::RunnerConfig;
use handoff::catalog::service::ProductService;
use handoff::concurrency::cancel::CallContext;
use handoff::error::ErrorKind;
use handoff::handoff_error;
use handoff::runner::pool::WorkerPool;
use handoff::store::memory::MemoryStore;
use handoff::test_utils::fixtures::{TEST_CATEGORY, product_requests};
use handoff::test_utils::store::TestStoreWrapper;
use telemetry::tracing::init_test_tracing;

fn pool(size: usize, queue_capacity: usize) -> WorkerPool {
    WorkerPool::with_size(
        NonZeroUsize::new(size).unwrap(),
        NonZeroUsize::new(queue_capacity).unwrap(),
    )
}

#[tokio::test(flavor = "multi_thread")]
async fn more_units_than_workers_each_get_their_own_outcome() {
    init_test_tracing();

    let pool = pool(3, 2);
    let ctx = CallContext::background();

    let mut receivers = Vec::new();
    for i in 0..25u64 {
        let rx = pool
            .submit(&ctx, move || async move {
                // Finish out of submission order.
                tokio::time::sleep(Duration::from_millis(25 - i)).await;
                if i % 5 == 0 {
                    Err(handoff_error!(
                        ErrorKind::Unavailable,
                        "Backend unreachable",
                        detail = i.to_string()
                    ))
                } else {
                    Ok(i)
                }
            })
            .await;
        receivers.push((i, rx));
    }

    for (i, rx) in receivers {
        match rx.recv(&ctx).await {
            Ok(value) => assert_eq!(value, i),
            Err(err) => {
                assert_eq!(i % 5, 0);
                assert_eq!(err.kind(), ErrorKind::Unavailable);
                assert_eq!(err.detail(), Some(i.to_string().as_str()));
            }
        }
    }

    pool.shutdown().await;
    pool.wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn pooled_products_are_matched_to_their_requests() {
    init_test_tracing();

    let store = TestStoreWrapper::wrap(MemoryStore::with_categories([TEST_CATEGORY]).await);
    store.set_lookup_delay(Duration::from_millis(5)).await;
    let service = ProductService::new(store, pool(2, 2), &RunnerConfig::default());
    let ctx = CallContext::background();

    let requests = product_requests(12, TEST_CATEGORY);
    let mut receivers = Vec::new();
    for request in requests.clone() {
        receivers.push(service.create_product_pooled(&ctx, request).await);
    }

    for (request, rx) in requests.into_iter().zip(receivers) {
        let product = rx.recv(&ctx).await.unwrap();
        assert_eq!(product.sku, request.sku);
        assert_eq!(product.name, request.name);
    }
    assert_eq!(service.store().wrapped().product_count().await, 12);
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_unit_does_not_take_down_the_pool() {
    init_test_tracing();

    let pool = pool(1, 1);
    let ctx = CallContext::background();

    let panicking = pool
        .submit(&ctx, || async {
            let values: Vec<u64> = Vec::new();
            Ok(values[1])
        })
        .await;
    let healthy = pool.submit(&ctx, || async { Ok(7u64) }).await;

    assert_eq!(panicking.recv(&ctx).await.unwrap_err().kind(), ErrorKind::WorkerPanic);
    assert_eq!(healthy.recv(&ctx).await.unwrap(), 7);

    pool.shutdown().await;
    pool.wait().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn shutdown_drains_queued_units_and_rejects_new_ones() {
    init_test_tracing();

    let pool = pool(1, 4);
    let ctx = CallContext::background();

    let mut receivers = Vec::new();
    for i in 0..4u32 {
        receivers.push(
            pool.submit(&ctx, move || async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(i)
            })
            .await,
        );
    }
    pool.shutdown().await;

    let rejected = pool.submit(&ctx, || async { Ok(99u32) }).await;
    assert_eq!(rejected.recv(&ctx).await.unwrap_err().kind(), ErrorKind::PoolClosed);

    for (i, rx) in receivers.into_iter().enumerate() {
        assert_eq!(rx.recv(&ctx).await.unwrap(), i as u32);
    }
    pool.wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn submission_to_a_full_queue_is_bounded_by_the_context() {
    init_test_tracing();

    let pool = pool(1, 1);
    let ctx = CallContext::background();
    let (started_tx, started_rx) = tokio::sync::oneshot::channel();
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

    let blocker = pool
        .submit(&ctx, move || async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
            Ok(())
        })
        .await;
    started_rx.await.unwrap();
    let queued = pool.submit(&ctx, || async { Ok(()) }).await;

    let short = CallContext::background().with_timeout(Duration::from_millis(50));
    let rejected = pool.submit(&short, || async { Ok(()) }).await;
    assert_eq!(
        rejected.recv(&ctx).await.unwrap_err().kind(),
        ErrorKind::DeadlineExceeded
    );

    release_tx.send(()).unwrap();
    blocker.recv(&ctx).await.unwrap();
    queued.recv(&ctx).await.unwrap();
}
