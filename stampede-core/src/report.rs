use crate::{RunStatistics, REPORT_FILE_PREFIX};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Read-only summary of one test group, derived once from its frozen statistics.
///
/// Latency fields are milliseconds and are `0` when the group had no successful
/// request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinalReport {
    pub model: String,
    pub total_requests_sent: u64,
    pub requests_per_second: f64,
    pub avg_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
    pub error_percent: f64,
    pub canceled_requests: u64,
}

impl FinalReport {
    /// `test_duration` is the configured window, not the measured wall-clock time.
    pub fn from_statistics(model: &str, stats: &RunStatistics, test_duration: Duration) -> Self {
        let secs = test_duration.as_secs_f64();
        let requests_per_second = if secs > 0. {
            stats.success_count as f64 / secs
        } else {
            0.
        };

        let error_percent = if stats.total_sent > 0 {
            stats.error_count as f64 / stats.total_sent as f64 * 100.
        } else {
            0.
        };

        Self {
            model: model.to_string(),
            total_requests_sent: stats.total_sent,
            requests_per_second,
            avg_response_time_ms: stats.latency.mean().map_or(0., as_ms),
            min_response_time_ms: stats.latency.min.map_or(0., as_ms),
            max_response_time_ms: stats.latency.max.map_or(0., as_ms),
            error_percent,
            canceled_requests: stats.canceled_count,
        }
    }

    /// Deterministic file name for this report.
    pub fn file_name(&self) -> String {
        report_file_name(&self.model)
    }
}

impl fmt::Display for FinalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {}", self.model)?;
        writeln!(f, "Total requests sent: {}", self.total_requests_sent)?;
        writeln!(f, "Requests/s: {:.2}", self.requests_per_second)?;
        writeln!(
            f,
            "Avg. response time (ms): {:.2}",
            self.avg_response_time_ms
        )?;
        writeln!(f, "Min(ms): {:.2}", self.min_response_time_ms)?;
        writeln!(f, "Max(ms): {:.2}", self.max_response_time_ms)?;
        writeln!(f, "Error %: {:.2}%", self.error_percent)?;
        writeln!(f, "Canceled requests: {}", self.canceled_requests)?;
        writeln!(f)
    }
}

/// `api_metrics_<name>.txt` with every character that is not ASCII alphanumeric
/// replaced by `_`.
pub fn report_file_name(model: &str) -> String {
    let sanitized: String = model
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{REPORT_FILE_PREFIX}{sanitized}.txt")
}

fn as_ms(dur: Duration) -> f64 {
    dur.as_nanos() as f64 / 1_000_000.
}
