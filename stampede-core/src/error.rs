use thiserror::Error;

/// Invalid run configuration. Always surfaced before any load is generated.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`virtual_users` must be at least 1 (got {0})")]
    InvalidVirtualUsers(usize),

    #[error("`test_duration` must be greater than zero and, with `cancel_grace`, at most {:?}", crate::MAX_DURATION)]
    InvalidTestDuration,

    #[error("`http_timeout` must be greater than zero and at most {:?}", crate::MAX_DURATION)]
    InvalidHttpTimeout,

    #[error("`progress_interval` must be greater than zero and at most {:?} when set", crate::MAX_DURATION)]
    InvalidProgressInterval,

    #[error("no test groups configured")]
    NoGroups,

    #[error("test group name must not be empty")]
    EmptyGroupName,

    #[error("test group `{0}` has no request templates")]
    EmptyTemplates(String),

    #[error("test group `{0}` is configured more than once")]
    DuplicateGroup(String),

    #[error("test groups `{first}` and `{second}` would write the same report file")]
    ReportNameCollision { first: String, second: String },

    #[error("invalid endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("failed to parse test plan: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
