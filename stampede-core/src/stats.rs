use crate::Outcome;
use serde::Serialize;
use std::time::Duration;

/// Running summary of successful latencies.
///
/// Kept in integer nanoseconds so the result does not depend on the order
/// latencies were recorded in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub total: Duration,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
}

impl LatencySummary {
    pub fn record(&mut self, latency: Duration) {
        self.count += 1;
        self.total = self.total.saturating_add(latency);
        self.min = Some(self.min.map_or(latency, |min| min.min(latency)));
        self.max = Some(self.max.map_or(latency, |max| max.max(latency)));
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        let nanos = self.total.as_nanos() / u128::from(self.count);
        Some(Duration::from_nanos(
            u64::try_from(nanos).unwrap_or(u64::MAX),
        ))
    }
}

/// Request accounting for one test group.
///
/// Mutated through [`RunStatistics::record`] while the group runs, then frozen and
/// used read-only to derive a [`crate::FinalReport`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub total_sent: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub canceled_count: u64,
    pub latency: LatencySummary,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &Outcome) {
        self.total_sent += 1;
        match outcome {
            Outcome::Success { latency } => {
                self.success_count += 1;
                self.latency.record(*latency);
            }
            Outcome::Failure(_) => self.error_count += 1,
            Outcome::Canceled => self.canceled_count += 1,
        }
    }

    /// `total_sent == success_count + error_count + canceled_count`, and every
    /// success contributed one latency.
    pub fn is_consistent(&self) -> bool {
        self.success_count
            .checked_add(self.error_count)
            .and_then(|sum| sum.checked_add(self.canceled_count))
            == Some(self.total_sent)
            && self.latency.count == self.success_count
    }
}

impl FromIterator<Outcome> for RunStatistics {
    fn from_iter<I: IntoIterator<Item = Outcome>>(iter: I) -> Self {
        let mut stats = Self::new();
        for outcome in iter {
            stats.record(&outcome);
        }
        stats
    }
}
