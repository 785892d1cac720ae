//! Virtual users: saturating request loops bound to a group deadline.
use crate::aggregator::GroupMetrics;
use crate::deadline::DeadlineHandle;
use crate::executor::{RequestExecutor, Transport};
use stampede_core::{Outcome, TestGroup};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Everything a virtual user needs, shared by all users of a group.
pub(crate) struct VuContext<T> {
    pub group: Arc<TestGroup>,
    pub executor: RequestExecutor<T>,
    pub metrics: Arc<GroupMetrics>,
    pub deadline: DeadlineHandle,
    pub http_timeout: Duration,
    pub cancel_grace: Duration,
}

impl<T> Clone for VuContext<T> {
    fn clone(&self) -> Self {
        Self {
            group: self.group.clone(),
            executor: self.executor.clone(),
            metrics: self.metrics.clone(),
            deadline: self.deadline.clone(),
            http_timeout: self.http_timeout,
            cancel_grace: self.cancel_grace,
        }
    }
}

/// What one virtual user did over its lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VuSummary {
    pub dispatched: u64,
    pub canceled: u64,
}

/// Spawn `count` virtual users and wait until every one of them has exited.
pub(crate) async fn run_virtual_users<T>(ctx: VuContext<T>, count: usize) -> Vec<VuSummary>
where
    T: Transport + Sync + 'static,
{
    let tasks: Vec<JoinHandle<VuSummary>> = (0..count)
        .map(|vu_id| {
            let ctx = ctx.clone();
            tokio::spawn(vu_loop(ctx).instrument(tracing::debug_span!("vu", id = vu_id)))
        })
        .collect();

    let mut summaries = Vec::with_capacity(count);
    for (vu_id, task) in tasks.into_iter().enumerate() {
        match task.await {
            Ok(summary) => {
                trace!("VU {vu_id} exited: {summary:?}");
                summaries.push(summary);
            }
            Err(err) => error!("VU {vu_id} terminated abnormally: {err}"),
        }
    }
    summaries
}

async fn vu_loop<T: Transport + Sync>(ctx: VuContext<T>) -> VuSummary {
    let mut summary = VuSummary::default();
    let mut next_template = 0usize;

    while !ctx.deadline.is_expired() {
        let Some(template) = ctx.group.template(next_template) else {
            error!("Group {} has no request templates.", ctx.group.name);
            break;
        };
        next_template = next_template.wrapping_add(1);
        summary.dispatched += 1;

        // NOTE: Biased so a request that settles in the same poll as the deadline keeps
        // its natural outcome.
        let outcome = tokio::select! {
            biased;
            outcome = ctx.executor.execute(template, ctx.http_timeout) => outcome,
            _ = expired_with_grace(&ctx.deadline, ctx.cancel_grace) => Outcome::Canceled,
        };

        if outcome.is_canceled() {
            summary.canceled += 1;
        }

        if let Err(err) = ctx.metrics.record(&outcome) {
            error!("Failed to record outcome: {err}");
        }
    }

    summary
}

async fn expired_with_grace(deadline: &DeadlineHandle, grace: Duration) {
    deadline.expired().await;
    if !grace.is_zero() {
        tokio::time::sleep(grace).await;
    }
}
