use std::time::Duration;

use config::shared::RunnerConfig;
use futures::FutureExt;
use handoff::catalog::service::ProductService;
use handoff::concurrency::cancel::CallContext;
use handoff::error::ErrorKind;
use handoff::handoff_error;
use handoff::runner::pool::WorkerPool;
use handoff::store::memory::MemoryStore;
use handoff::test_utils::fixtures::{MISSING_CATEGORY, TEST_CATEGORY, product_request};
use handoff::test_utils::store::TestStoreWrapper;
use handoff::test_utils::transaction::{ScriptedTransactionSource, TransactionEvent};
use handoff::transaction::run_in_transaction;
use telemetry::tracing::init_test_tracing;
use tokio::time::Instant;

#[tokio::test]
async fn successful_unit_commits_every_write() {
    init_test_tracing();

    let source = ScriptedTransactionSource::new();

    let value = run_in_transaction(&CallContext::background(), &source, |tx| {
        async move {
            tx.write("first");
            tx.write("second");
            Ok(2)
        }
        .boxed()
    })
    .await
    .unwrap();

    assert_eq!(value, 2);
    assert_eq!(source.committed(), vec!["first", "second"]);
    assert_eq!(
        source.events(),
        vec![
            TransactionEvent::Begin,
            TransactionEvent::Write("first".to_string()),
            TransactionEvent::Write("second".to_string()),
            TransactionEvent::Commit,
        ]
    );
}

#[tokio::test]
async fn failing_unit_rolls_back_and_keeps_its_error() {
    init_test_tracing();

    let source = ScriptedTransactionSource::new();

    let err = run_in_transaction(&CallContext::background(), &source, |tx| {
        async move {
            tx.write("partial");
            Err::<(), _>(handoff_error!(
                ErrorKind::DependencyNotFound,
                "Category not found"
            ))
        }
        .boxed()
    })
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyNotFound);
    assert!(source.committed().is_empty());
    assert_eq!(source.events().last(), Some(&TransactionEvent::Rollback));
}

#[tokio::test]
async fn begin_failure_never_invokes_the_unit() {
    init_test_tracing();

    let source = ScriptedTransactionSource::new().fail_begin();
    let mut invoked = false;

    let err = run_in_transaction(&CallContext::background(), &source, |_tx| {
        invoked = true;
        async { Ok(()) }.boxed()
    })
    .await
    .unwrap_err();

    assert!(!invoked);
    assert_eq!(err.kind(), ErrorKind::Unavailable);
    assert_eq!(source.events(), vec![TransactionEvent::Begin]);
}

#[tokio::test(start_paused = true)]
async fn slow_begin_is_bounded_by_the_call_context() {
    init_test_tracing();

    let source = ScriptedTransactionSource::new().begin_delay(Duration::from_secs(5));
    let ctx = CallContext::background().with_timeout(Duration::from_millis(100));
    let mut invoked = false;

    let started = Instant::now();
    let err = run_in_transaction(&ctx, &source, |_tx| {
        invoked = true;
        async { Ok(()) }.boxed()
    })
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!invoked);
    assert!(source.committed().is_empty());
}

#[tokio::test]
async fn commit_failure_is_reported_as_commit_failed() {
    init_test_tracing();

    let source = ScriptedTransactionSource::new().fail_commit();

    let err = run_in_transaction(&CallContext::background(), &source, |tx| {
        async move {
            tx.write("lost");
            Ok(())
        }
        .boxed()
    })
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CommitFailed);
    assert!(std::error::Error::source(&err).is_some());
    assert!(source.committed().is_empty());
}

#[tokio::test]
async fn rollback_failure_is_reported_alongside_the_unit_error() {
    init_test_tracing();

    let source = ScriptedTransactionSource::new().fail_rollback();

    let err = run_in_transaction(&CallContext::background(), &source, |_tx| {
        async {
            Err::<(), _>(handoff_error!(
                ErrorKind::Conflict,
                "Product sku already exists"
            ))
        }
        .boxed()
    })
    .await
    .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        err.kinds(),
        vec![ErrorKind::Conflict, ErrorKind::RollbackFailed]
    );
}

#[tokio::test]
async fn failed_batch_leaves_no_product_visible() {
    init_test_tracing();

    let store = TestStoreWrapper::wrap(MemoryStore::with_categories([TEST_CATEGORY]).await);
    let pool = WorkerPool::with_size(std::num::NonZeroUsize::MIN, std::num::NonZeroUsize::MIN);
    let service = ProductService::new(store, pool, &RunnerConfig::default());

    let err = service
        .create_products_tx(
            &CallContext::background(),
            vec![
                product_request("BATCH-1", TEST_CATEGORY),
                product_request("BATCH-2", TEST_CATEGORY),
                product_request("BATCH-3", MISSING_CATEGORY),
            ],
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DependencyNotFound);
    assert_eq!(service.store().persist_calls().await, 2);
    assert_eq!(service.store().wrapped().product_count().await, 0);
}
