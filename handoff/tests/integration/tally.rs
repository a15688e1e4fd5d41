use handoff::tally::{SharedTally, tally_owned, tally_shared};
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn shared_and_owned_tallies_agree() {
    init_test_tracing();

    let shared = tally_shared(100, 500).await.unwrap();
    let owned = tally_owned(100, 500).await.unwrap();

    assert_eq!(shared, 50_000);
    assert_eq!(owned, shared);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn shared_tally_is_exact_across_spawned_tasks() {
    init_test_tracing();

    let tally = SharedTally::new();
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let tally = tally.clone();
            tokio::spawn(async move {
                for _ in 0..250 {
                    tally.add(2).await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(tally.value().await, 16_000);
}
