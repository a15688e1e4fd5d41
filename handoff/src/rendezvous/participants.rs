use std::time::Duration;

use tracing::{info, warn};

use crate::concurrency::cancel::CallContext;
use crate::error::HandoffResult;
use crate::rendezvous::types::{Branch, Merge, PullRequest, Rejection, RejectionReason, Review};
use crate::rendezvous::work::{ApproverEnd, RequesterEnd};

/// States of the requesting task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequesterState {
    Idle,
    PullRequestSent,
    AwaitingMerge,
    /// An approved merge arrived.
    Confirmed,
    /// The pull request was rejected or merged without approval.
    Abandoned,
}

/// States of the approving task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApproverState {
    Idle,
    AwaitingPullRequest,
    Evaluating,
    MergeSent,
    Rejected,
}

/// What the requesting task went through and what it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterReport {
    pub transitions: Vec<RequesterState>,
    pub review: Review,
}

impl RequesterReport {
    /// Returns the terminal state.
    pub fn state(&self) -> RequesterState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(RequesterState::Idle)
    }
}

/// What the approving task went through and what it sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproverReport {
    pub transitions: Vec<ApproverState>,
    pub pull_request: PullRequest,
    pub review: Review,
}

impl ApproverReport {
    /// Returns the terminal state.
    pub fn state(&self) -> ApproverState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(ApproverState::Idle)
    }
}

/// Sends one pull request and waits for exactly one review.
///
/// Does not retry: a rejection or an unapproved merge ends in [`RequesterState::Abandoned`].
pub async fn request_merge(
    ctx: &CallContext,
    end: RequesterEnd,
    pull_request: PullRequest,
) -> HandoffResult<RequesterReport> {
    let mut transitions = vec![RequesterState::Idle];

    info!(actor = %pull_request.actor, branch = %pull_request.branch, "pull request requested");
    end.send_pull_request(ctx, pull_request).await?;
    transitions.push(RequesterState::PullRequestSent);

    transitions.push(RequesterState::AwaitingMerge);
    let review = end.recv_review(ctx).await?;

    let state = match review.approved_merge() {
        Some(merge) => {
            info!(from = %merge.from, to = %merge.to, "pull request successfully merged");
            RequesterState::Confirmed
        }
        None => {
            info!("pull request abandoned");
            RequesterState::Abandoned
        }
    };
    transitions.push(state);

    Ok(RequesterReport {
        transitions,
        review,
    })
}

/// Waits for one pull request, evaluates it and always answers with one review.
///
/// Pull requests with an actor are merged into the protected branch; the others are rejected.
/// `processing_delay` is spent before receiving and again before merging.
pub async fn review_pull_request(
    ctx: &CallContext,
    end: ApproverEnd,
    protected_branch: &str,
    processing_delay: Duration,
) -> HandoffResult<ApproverReport> {
    let mut transitions = vec![ApproverState::Idle, ApproverState::AwaitingPullRequest];

    process(ctx, processing_delay).await?;
    let pull_request = end.recv_pull_request(ctx).await?;
    transitions.push(ApproverState::Evaluating);

    let (review, state) = if pull_request.actor.is_empty() {
        warn!(branch = %pull_request.branch, "pull request rejected, it has no actor");
        let rejection = Rejection {
            branch: pull_request.branch.clone(),
            reason: RejectionReason::MissingActor,
        };

        (Review::Rejected(rejection), ApproverState::Rejected)
    } else {
        info!(actor = %pull_request.actor, "pull request processed");
        process(ctx, processing_delay).await?;
        let merge = Merge {
            to: Branch::protected(protected_branch),
            from: pull_request.branch.clone(),
            approved: true,
        };

        (Review::Merged(merge), ApproverState::MergeSent)
    };

    end.send_review(ctx, review.clone()).await?;
    transitions.push(state);

    if state == ApproverState::MergeSent {
        info!(from = %pull_request.branch, to = protected_branch, "pull request merged");
    }

    Ok(ApproverReport {
        transitions,
        pull_request,
        review,
    })
}

async fn process(ctx: &CallContext, delay: Duration) -> HandoffResult<()> {
    if !delay.is_zero() {
        ctx.run(tokio::time::sleep(delay)).await?;
    }

    Ok(())
}
