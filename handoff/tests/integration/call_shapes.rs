use std::num::NonZeroUsize;

use config::shared::RunnerConfig;
use handoff::catalog::request::ProductCreateRequest;
use handoff::catalog::service::ProductService;
use handoff::catalog::types::Product;
use handoff::concurrency::cancel::CallContext;
use handoff::error::{ErrorKind, HandoffResult};
use handoff::runner::pool::WorkerPool;
use handoff::store::memory::MemoryStore;
use handoff::test_utils::fixtures::{
    MISSING_CATEGORY, TEST_CATEGORY, invalid_product_request, product_request,
};
use handoff::test_utils::store::TestStoreWrapper;
use telemetry::tracing::init_test_tracing;

type TestService = ProductService<TestStoreWrapper<MemoryStore>>;

async fn test_service() -> TestService {
    let store = TestStoreWrapper::wrap(MemoryStore::with_categories([TEST_CATEGORY]).await);
    let pool = WorkerPool::with_size(NonZeroUsize::new(2).unwrap(), NonZeroUsize::new(4).unwrap());

    ProductService::new(store, pool, &RunnerConfig::default())
}

/// Runs `request` through every call shape, in order: inline, spawned, pooled, transactional.
async fn run_every_shape(
    service: &TestService,
    requests: [ProductCreateRequest; 4],
) -> Vec<HandoffResult<Product>> {
    let ctx = CallContext::background();
    let [inline, spawned, pooled, transactional] = requests;

    vec![
        service.create_product(&ctx, inline).await,
        service.create_product_async(&ctx, spawned).recv(&ctx).await,
        service
            .create_product_pooled(&ctx, pooled)
            .await
            .recv(&ctx)
            .await,
        service.create_product_tx(&ctx, transactional).await,
    ]
}

#[tokio::test(flavor = "multi_thread")]
async fn every_shape_creates_an_equivalent_product() {
    init_test_tracing();

    let service = test_service().await;
    // Identical requests apart from the sku, which must stay unique.
    let template = product_request("A-0", TEST_CATEGORY);
    let requests = ["A-1", "A-2", "A-3", "A-4"].map(|sku| ProductCreateRequest {
        sku: sku.to_string(),
        ..template.clone()
    });

    let results = run_every_shape(&service, requests.clone()).await;

    let ctx = CallContext::background();
    let products: Vec<Product> = results.into_iter().map(Result::unwrap).collect();
    let reference = &products[0];
    for (product, request) in products.iter().zip(&requests) {
        assert_eq!(product.sku, request.sku);
        assert_eq!(product.category, TEST_CATEGORY);
        assert_eq!(product.price, template.price);
        let normalized = Product {
            sku: reference.sku.clone(),
            ..product.clone()
        };
        assert!(
            normalized.same_fields(reference),
            "{product:?} differs from {reference:?}"
        );

        let stored = service.product_by_id(&ctx, product.id).await.unwrap();
        assert_eq!(stored.as_ref(), Some(product));
    }
    assert_eq!(service.store().persist_calls().await, 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_category_fails_without_persisting_in_every_shape() {
    init_test_tracing();

    let service = test_service().await;
    let requests = ["B-1", "B-2", "B-3", "B-4"].map(|sku| product_request(sku, MISSING_CATEGORY));

    let results = run_every_shape(&service, requests).await;

    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DependencyNotFound);
        assert_eq!(err.detail(), Some(MISSING_CATEGORY));
        assert!(err.is_client_fault());
    }
    assert_eq!(service.store().lookup_calls().await, 4);
    assert_eq!(service.store().persist_calls().await, 0);
    assert_eq!(service.store().wrapped().product_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_request_fails_before_any_lookup_in_every_shape() {
    init_test_tracing();

    let service = test_service().await;
    let requests = std::array::from_fn(|_| invalid_product_request());

    let results = run_every_shape(&service, requests).await;

    for result in results {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidData);
    }
    assert_eq!(service.store().lookup_calls().await, 0);
    assert_eq!(service.store().persist_calls().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn persist_failure_reports_the_same_kind_in_every_shape() {
    init_test_tracing();

    let service = test_service().await;
    service
        .store()
        .set_persist_failure(Some(ErrorKind::Unavailable))
        .await;
    let requests = ["C-1", "C-2", "C-3", "C-4"].map(|sku| product_request(sku, TEST_CATEGORY));

    let results = run_every_shape(&service, requests).await;

    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(err.is_retryable());
    }
    assert_eq!(service.store().wrapped().product_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_sku_conflicts_in_every_shape() {
    init_test_tracing();

    let service = test_service().await;
    service
        .create_product(&CallContext::background(), product_request("DUP", TEST_CATEGORY))
        .await
        .unwrap();
    let requests = std::array::from_fn(|_| product_request("DUP", TEST_CATEGORY));

    let results = run_every_shape(&service, requests).await;

    for result in results {
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Conflict);
    }
    assert_eq!(service.store().wrapped().product_count().await, 1);
}
