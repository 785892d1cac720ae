//! Single-request execution: timeout, latency measurement and classification.
use serde_json::Value;
use stampede_core::{Outcome, TransportError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Sends one request template to the target and waits for the full response.
///
/// Implementations only report whether the exchange succeeded; timing and the
/// per-request timeout are applied by [`RequestExecutor`].
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    async fn send(&self, payload: &Value) -> Result<(), TransportError>;
}

/// Stateless wrapper turning a [`Transport`] call into an [`Outcome`].
pub struct RequestExecutor<T> {
    transport: Arc<T>,
}

impl<T> Clone for RequestExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

impl<T: Transport + Sync> RequestExecutor<T> {
    pub fn new(transport: T) -> Self {
        Self::from_arc(Arc::new(transport))
    }

    pub fn from_arc(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Never returns [`Outcome::Canceled`]; cancellation is decided by the caller.
    pub async fn execute(&self, template: &Value, timeout: Duration) -> Outcome {
        let start = Instant::now();
        let res = tokio::time::timeout(timeout, self.transport.send(template)).await;
        let latency = start.elapsed();

        match res {
            Ok(Ok(())) => Outcome::success(latency),
            Ok(Err(err)) => {
                debug!("Request failed after {latency:?}: {err}");
                Outcome::Failure(err)
            }
            Err(_) => {
                debug!("Request timed out after {timeout:?}");
                Outcome::Failure(TransportError::Timeout(timeout))
            }
        }
    }
}
