use stampede_core::{ConfigError, RunStatistics};
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = RunError> = std::result::Result<T, E>;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error("failed to emit report: {0}")]
    Report(#[from] ReportError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("test group `{0}` is not registered")]
    UnknownGroup(String),

    #[error("test group `{0}` is frozen; outcome rejected")]
    Frozen(String),

    /// `total_sent` does not match the per-variant counts. A logic defect, never
    /// expected in practice.
    #[error("inconsistent statistics for `{group}`: {stats:?}")]
    Inconsistent {
        group: String,
        stats: RunStatistics,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create output directory `{}`: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write `{}`: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
