//! Concurrent outcome accounting.
//!
//! Every test group owns one [`GroupMetrics`]. All virtual users of the group
//! record into it through a single lock, so the counters are never observed
//! half-updated. Once the group has drained it is frozen and becomes read-only.
use crate::error::AggregationError;
use dashmap::DashMap;
use stampede_core::{Outcome, RunStatistics};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

pub struct GroupMetrics {
    name: String,
    state: Mutex<State>,
}

enum State {
    Recording(RunStatistics),
    Frozen(RunStatistics),
}

impl GroupMetrics {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Mutex::new(State::Recording(RunStatistics::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record(&self, outcome: &Outcome) -> Result<(), AggregationError> {
        {
            let mut state = self.lock();
            match &mut *state {
                State::Recording(stats) => stats.record(outcome),
                State::Frozen(_) => {
                    warn!("Outcome for frozen group {} dropped: {outcome:?}", self.name);
                    return Err(AggregationError::Frozen(self.name.clone()));
                }
            }
        }

        #[cfg(feature = "metrics")]
        emit_metrics(&self.name, outcome);

        Ok(())
    }

    /// Current counters. Consistent at every observation, even while recording.
    pub fn snapshot(&self) -> RunStatistics {
        match &*self.lock() {
            State::Recording(stats) | State::Frozen(stats) => stats.clone(),
        }
    }

    pub fn is_frozen(&self) -> bool {
        matches!(&*self.lock(), State::Frozen(_))
    }

    /// Stop accepting outcomes and return the final statistics.
    ///
    /// Calling it again returns the identical snapshot.
    pub fn freeze(&self) -> Result<RunStatistics, AggregationError> {
        let stats = {
            let mut state = self.lock();
            let stats = match &mut *state {
                State::Recording(stats) => std::mem::take(stats),
                State::Frozen(stats) => stats.clone(),
            };
            *state = State::Frozen(stats.clone());
            stats
        };

        if stats.is_consistent() {
            Ok(stats)
        } else {
            error!("Inconsistent statistics for group {}: {stats:?}", self.name);
            Err(AggregationError::Inconsistent {
                group: self.name.clone(),
                stats,
            })
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // NOTE: No code path panics while holding the lock; a poisoned state is still valid.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(feature = "metrics")]
fn emit_metrics(group: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Success { latency } => {
            metrics::counter!("stampede_requests_success", "group" => group.to_string())
                .increment(1);
            metrics::histogram!("stampede_request_latency", "group" => group.to_string())
                .record(latency.as_secs_f64());
        }
        Outcome::Failure(err) => {
            metrics::counter!(
                "stampede_requests_error",
                "group" => group.to_string(),
                "kind" => err.category()
            )
            .increment(1);
        }
        Outcome::Canceled => {
            metrics::counter!("stampede_requests_canceled", "group" => group.to_string())
                .increment(1);
        }
    }
}

#[cfg(feature = "metrics")]
pub(crate) fn describe_metrics() {
    metrics::describe_counter!(
        "stampede_requests_success",
        "Requests that received a success response"
    );
    metrics::describe_counter!(
        "stampede_requests_error",
        "Requests that failed or timed out"
    );
    metrics::describe_counter!(
        "stampede_requests_canceled",
        "Requests abandoned at the group deadline"
    );
    metrics::describe_histogram!(
        "stampede_request_latency",
        metrics::Unit::Seconds,
        "Latency of successful requests"
    );
}

/// Registry of [`GroupMetrics`] keyed by group name.
#[derive(Default)]
pub struct Aggregator {
    groups: DashMap<String, Arc<GroupMetrics>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulator for `group`, created on first use.
    pub fn register(&self, group: &str) -> Arc<GroupMetrics> {
        self.groups
            .entry(group.to_string())
            .or_insert_with(|| Arc::new(GroupMetrics::new(group)))
            .value()
            .clone()
    }

    pub fn group(&self, group: &str) -> Option<Arc<GroupMetrics>> {
        self.groups.get(group).map(|entry| entry.value().clone())
    }

    pub fn record(&self, group: &str, outcome: &Outcome) -> Result<(), AggregationError> {
        self.lookup(group)?.record(outcome)
    }

    pub fn freeze(&self, group: &str) -> Result<RunStatistics, AggregationError> {
        self.lookup(group)?.freeze()
    }

    fn lookup(&self, group: &str) -> Result<Arc<GroupMetrics>, AggregationError> {
        self.group(group)
            .ok_or_else(|| AggregationError::UnknownGroup(group.to_string()))
    }
}
