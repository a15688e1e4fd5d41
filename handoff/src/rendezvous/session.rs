use config::shared::RendezvousConfig;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::concurrency::cancel::CallContext;
use crate::error::{ErrorKind, HandoffResult};
use crate::handoff_error;
use crate::rendezvous::participants::{
    ApproverReport, RequesterReport, request_merge, review_pull_request,
};
use crate::rendezvous::types::{Merge, PullRequest};
use crate::rendezvous::work::Work;

/// Number of participants the session waits for before closing its channels.
const PARTICIPANTS: usize = 2;

/// Outcome of one rendezvous session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub requester: RequesterReport,
    pub approver: ApproverReport,
    /// Messages left in the channels when they were closed.
    pub undelivered: usize,
}

impl SessionReport {
    /// Returns the merge the requester confirmed, if any.
    pub fn merged(&self) -> Option<&Merge> {
        self.requester.review.approved_merge()
    }
}

enum ParticipantReport {
    Requester(RequesterReport),
    Approver(ApproverReport),
}

/// Coordinates one requesting and one approving task.
#[derive(Debug, Clone)]
pub struct RendezvousSession {
    config: RendezvousConfig,
}

impl RendezvousSession {
    pub fn new(config: RendezvousConfig) -> Self {
        Self { config }
    }

    /// Runs both participants for `pull_request` and closes the channels once both finished.
    ///
    /// Both participants run under a child of `ctx`. The first participant failure cancels that
    /// child so the other one stops waiting too, which keeps the join barrier from blocking.
    pub async fn run(
        &self,
        ctx: &CallContext,
        pull_request: PullRequest,
    ) -> HandoffResult<SessionReport> {
        let work = Work::new();
        let (session_ctx, cancel) = ctx.with_cancel();

        let mut participants = JoinSet::new();

        let approver_ctx = session_ctx.clone();
        let approver_end = work.approver_end();
        let protected_branch = self.config.protected_branch.clone();
        let processing_delay = self.config.processing_delay();
        participants.spawn(async move {
            review_pull_request(
                &approver_ctx,
                approver_end,
                &protected_branch,
                processing_delay,
            )
            .await
            .map(ParticipantReport::Approver)
        });

        let requester_ctx = session_ctx;
        let requester_end = work.requester_end();
        participants.spawn(async move {
            request_merge(&requester_ctx, requester_end, pull_request)
                .await
                .map(ParticipantReport::Requester)
        });

        let mut requester = None;
        let mut approver = None;
        let mut errors = Vec::new();

        // Join barrier: both participants must finish before the channels are closed.
        for _ in 0..PARTICIPANTS {
            let Some(result) = participants.join_next().await else {
                break;
            };

            match result {
                Ok(Ok(ParticipantReport::Requester(report))) => requester = Some(report),
                Ok(Ok(ParticipantReport::Approver(report))) => approver = Some(report),
                Ok(Err(err)) => {
                    error!(error = %err, "rendezvous participant failed");
                    cancel.cancel();
                    errors.push(err);
                }
                Err(join_err) => {
                    error!(error = %join_err, "rendezvous participant panicked");
                    cancel.cancel();
                    errors.push(handoff_error!(
                        ErrorKind::WorkerPanic,
                        "Rendezvous participant panicked",
                        join_err
                    ));
                }
            }
        }

        let undelivered = work.close().await;
        debug!("rendezvous session joined");

        match (requester, approver) {
            (Some(requester), Some(approver)) if errors.is_empty() => {
                info!(
                    requester_state = ?requester.state(),
                    approver_state = ?approver.state(),
                    "rendezvous session completed"
                );

                Ok(SessionReport {
                    requester,
                    approver,
                    undelivered,
                })
            }
            _ => Err(errors.into()),
        }
    }
}
