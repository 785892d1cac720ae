use std::time::Duration;

/// Number of concurrent virtual users when none is configured.
pub const DEFAULT_VIRTUAL_USERS: usize = 20;

/// Length of each group's load window when none is configured.
pub const DEFAULT_TEST_DURATION: Duration = Duration::from_secs(600);

/// Upper bound for every configured duration, and for a group's window plus its
/// cancel grace.
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Per-request timeout when none is configured.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout used for the reachability probe sent before a run.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Ollama's default listening port.
pub const DEFAULT_PORT: u16 = 11434;

pub const DEFAULT_PATH: &str = "/api/chat";

pub const DEFAULT_METHOD: &str = "POST";

/// Prefix of the per-group report file name.
pub const REPORT_FILE_PREFIX: &str = "api_metrics_";
