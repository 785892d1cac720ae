use std::time::Duration;
use thiserror::Error;

/// Result of one attempted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A well-formed success response; latency runs from dispatch to the full response.
    Success { latency: Duration },
    /// The request timed out or the transport reported an error.
    Failure(TransportError),
    /// The request was abandoned because the group deadline fired.
    Canceled,
}

impl Outcome {
    pub fn success(latency: Duration) -> Self {
        Self::Success { latency }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

/// Why a single request failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The per-request timeout elapsed before the response was received.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-success status code.
    #[error("server responded with status {0}")]
    Status(u16),

    /// Connection refused, DNS failure, TLS failure and the like.
    #[error("connection error: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Short category name, used as a metrics label and in debug logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Status(_) => "status",
            Self::Connect(_) => "connect",
            Self::Request(_) => "request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_variants_are_exclusive() {
        let outcomes = [
            Outcome::success(Duration::from_millis(5)),
            Outcome::Failure(TransportError::Status(500)),
            Outcome::Canceled,
        ];

        for outcome in &outcomes {
            let flags = [
                outcome.is_success(),
                outcome.is_failure(),
                outcome.is_canceled(),
            ];
            assert_eq!(flags.iter().filter(|f| **f).count(), 1);
        }
    }

    #[test]
    fn timeout_message_is_human_readable() {
        let err = TransportError::Timeout(Duration::from_secs(60));
        assert_eq!(err.to_string(), "request timed out after 60s");
        assert_eq!(err.category(), "timeout");
    }
}
