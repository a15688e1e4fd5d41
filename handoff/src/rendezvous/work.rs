use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

use crate::concurrency::cancel::CallContext;
use crate::error::{ErrorKind, HandoffResult};
use crate::handoff_error;
use crate::rendezvous::types::{PullRequest, Review};

/// Each channel carries a single message per session.
const CHANNEL_CAPACITY: usize = 1;

/// The channel pair of one rendezvous session.
///
/// The session owns both channels. Participants only get [`RequesterEnd`] and [`ApproverEnd`]
/// handles, so the channels stay open until [`Work::close`] runs, whichever participant finishes
/// first.
#[derive(Debug)]
pub struct Work {
    pull_request_tx: mpsc::Sender<PullRequest>,
    pull_request_rx: Arc<Mutex<mpsc::Receiver<PullRequest>>>,
    review_tx: mpsc::Sender<Review>,
    review_rx: Arc<Mutex<mpsc::Receiver<Review>>>,
}

impl Work {
    pub fn new() -> Self {
        let (pull_request_tx, pull_request_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (review_tx, review_rx) = mpsc::channel(CHANNEL_CAPACITY);

        Self {
            pull_request_tx,
            pull_request_rx: Arc::new(Mutex::new(pull_request_rx)),
            review_tx,
            review_rx: Arc::new(Mutex::new(review_rx)),
        }
    }

    /// Returns the handles used by the requesting task.
    pub fn requester_end(&self) -> RequesterEnd {
        RequesterEnd {
            pull_requests: self.pull_request_tx.clone(),
            reviews: self.review_rx.clone(),
        }
    }

    /// Returns the handles used by the approving task.
    pub fn approver_end(&self) -> ApproverEnd {
        ApproverEnd {
            pull_requests: self.pull_request_rx.clone(),
            reviews: self.review_tx.clone(),
        }
    }

    /// Closes both channels.
    ///
    /// Consumes the work, so it runs at most once. Returns the number of messages that were sent
    /// but never received; a well-formed session leaves none.
    pub async fn close(self) -> usize {
        let Work {
            pull_request_tx,
            pull_request_rx,
            review_tx,
            review_rx,
        } = self;
        drop(pull_request_tx);
        drop(review_tx);

        let mut undelivered = 0;

        let mut pull_requests = pull_request_rx.lock().await;
        pull_requests.close();
        while pull_requests.try_recv().is_ok() {
            undelivered += 1;
        }

        let mut reviews = review_rx.lock().await;
        reviews.close();
        while reviews.try_recv().is_ok() {
            undelivered += 1;
        }

        if undelivered > 0 {
            warn!(undelivered, "rendezvous channels closed with undelivered messages");
        } else {
            debug!("rendezvous channels closed");
        }

        undelivered
    }
}

impl Default for Work {
    fn default() -> Self {
        Self::new()
    }
}

/// Channel handles of the requesting task.
#[derive(Debug, Clone)]
pub struct RequesterEnd {
    pull_requests: mpsc::Sender<PullRequest>,
    reviews: Arc<Mutex<mpsc::Receiver<Review>>>,
}

impl RequesterEnd {
    /// Sends the pull request, bounded by `ctx`.
    pub async fn send_pull_request(
        &self,
        ctx: &CallContext,
        pull_request: PullRequest,
    ) -> HandoffResult<()> {
        ctx.run(self.pull_requests.send(pull_request))
            .await?
            .map_err(|_| {
                handoff_error!(
                    ErrorKind::InvalidState,
                    "Pull request channel closed before the pull request was sent"
                )
            })
    }

    /// Waits for the review, bounded by `ctx`.
    pub async fn recv_review(&self, ctx: &CallContext) -> HandoffResult<Review> {
        let review = ctx
            .run(async { self.reviews.lock().await.recv().await })
            .await?;

        review.ok_or_else(|| {
            handoff_error!(
                ErrorKind::InvalidState,
                "Review channel closed before a review arrived"
            )
        })
    }
}

/// Channel handles of the approving task.
#[derive(Debug, Clone)]
pub struct ApproverEnd {
    pull_requests: Arc<Mutex<mpsc::Receiver<PullRequest>>>,
    reviews: mpsc::Sender<Review>,
}

impl ApproverEnd {
    /// Waits for the pull request, bounded by `ctx`.
    pub async fn recv_pull_request(&self, ctx: &CallContext) -> HandoffResult<PullRequest> {
        let pull_request = ctx
            .run(async { self.pull_requests.lock().await.recv().await })
            .await?;

        pull_request.ok_or_else(|| {
            handoff_error!(
                ErrorKind::InvalidState,
                "Pull request channel closed before a pull request arrived"
            )
        })
    }

    /// Sends the review, bounded by `ctx`.
    pub async fn send_review(&self, ctx: &CallContext, review: Review) -> HandoffResult<()> {
        ctx.run(self.reviews.send(review)).await?.map_err(|_| {
            handoff_error!(
                ErrorKind::InvalidState,
                "Review channel closed before the review was sent"
            )
        })
    }
}
