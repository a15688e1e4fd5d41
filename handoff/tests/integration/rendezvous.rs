use std::time::Duration;

use config::shared::RendezvousConfig;
use handoff::concurrency::cancel::CallContext;
use handoff::error::ErrorKind;
use handoff::rendezvous::participants::{
    ApproverState, RequesterState, request_merge, review_pull_request,
};
use handoff::rendezvous::session::RendezvousSession;
use handoff::rendezvous::types::{Branch, PullRequest, Review};
use handoff::rendezvous::work::Work;
use telemetry::tracing::init_test_tracing;

#[tokio::test(flavor = "multi_thread")]
async fn contributor_pull_request_is_merged_into_master() {
    init_test_tracing();

    let session = RendezvousSession::new(RendezvousConfig::default());
    let ctx = CallContext::background().with_timeout(Duration::from_secs(5));

    let report = session.run(&ctx, PullRequest::default()).await.unwrap();

    let merge = report.merged().unwrap();
    assert!(merge.approved);
    assert!(merge.to.is_master);
    assert_eq!(merge.to.name, "Master");
    assert_eq!(report.approver.pull_request.actor, "Contributor");
    assert_eq!(report.requester.state(), RequesterState::Confirmed);
    assert_eq!(report.approver.state(), ApproverState::MergeSent);
}

#[tokio::test(flavor = "multi_thread")]
async fn pull_request_without_actor_terminates_rejected() {
    init_test_tracing();

    let session = RendezvousSession::new(RendezvousConfig::default());
    let ctx = CallContext::background().with_timeout(Duration::from_secs(5));

    let report = session
        .run(&ctx, PullRequest::new("", Branch::feature("Feature")))
        .await
        .unwrap();

    assert!(matches!(report.approver.review, Review::Rejected(_)));
    assert_eq!(report.requester.review, report.approver.review);
    assert_eq!(report.requester.state(), RequesterState::Abandoned);
    assert_eq!(report.undelivered, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn many_sessions_run_concurrently() {
    init_test_tracing();

    let session = RendezvousSession::new(RendezvousConfig {
        processing_delay_ms: 5,
        ..RendezvousConfig::default()
    });

    let mut handles = Vec::new();
    for i in 0..16 {
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            let actor = if i % 2 == 0 { "Contributor" } else { "" };
            let pull_request = PullRequest::new(actor, Branch::feature(format!("feature-{i}")));
            session.run(&CallContext::background(), pull_request).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let report = handle.await.unwrap().unwrap();
        assert_eq!(report.merged().is_some(), i % 2 == 0);
        assert_eq!(report.approver.pull_request.branch.name, format!("feature-{i}"));
    }
}

#[tokio::test(start_paused = true)]
async fn approver_without_requester_is_bounded_by_its_context() {
    init_test_tracing();

    let work = Work::new();
    let ctx = CallContext::background().with_timeout(Duration::from_secs(1));

    let err = review_pull_request(&ctx, work.approver_end(), "Master", Duration::ZERO)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    assert_eq!(work.close().await, 0);
}

#[tokio::test]
async fn participants_can_be_driven_without_a_session() {
    init_test_tracing();

    let work = Work::new();
    let ctx = CallContext::background();

    let (requester, approver) = tokio::join!(
        request_merge(&ctx, work.requester_end(), PullRequest::default()),
        review_pull_request(&ctx, work.approver_end(), "release", Duration::ZERO),
    );

    let requester = requester.unwrap();
    let approver = approver.unwrap();
    assert_eq!(requester.review, approver.review);
    assert_eq!(
        requester.review.approved_merge().unwrap().to,
        Branch::protected("release")
    );
    assert_eq!(work.close().await, 0);
}
