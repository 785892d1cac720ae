//! reqwest-backed [`Transport`] posting JSON templates to an inference endpoint.
use crate::executor::Transport;
use reqwest::{Client, Method};
use serde_json::Value;
use stampede_core::{ConfigError, Endpoint, TransportError, PROBE_TIMEOUT};
use url::Url;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    method: Method,
    url: Url,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &Endpoint) -> Result<Self, ConfigError> {
        Self::with_client(Client::new(), endpoint)
    }

    /// Reuse an existing client (and its connection pool).
    pub fn with_client(client: Client, endpoint: &Endpoint) -> Result<Self, ConfigError> {
        let method = Method::from_bytes(endpoint.method.as_bytes())
            .map_err(|_| ConfigError::InvalidMethod(endpoint.method.clone()))?;

        Ok(Self {
            client,
            method,
            url: endpoint.url()?,
            base_url: endpoint.base_url()?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GET the server root and report its status code.
    pub async fn probe(&self) -> Result<u16, TransportError> {
        let res = self
            .client
            .get(self.base_url.clone())
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|err| classify(&err))?;
        Ok(res.status().as_u16())
    }

    /// Run [`HttpTransport::probe`] and log the result. Never fails.
    pub async fn log_reachability(&self) {
        match self.probe().await {
            Ok(200) => info!("URL {} is reachable.", self.base_url),
            Ok(status) => warn!("URL {} returned status code {status}.", self.base_url),
            Err(err) => warn!("URL {} is not reachable: {err}", self.base_url),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, payload: &Value) -> Result<(), TransportError> {
        let res = self
            .client
            .request(self.method.clone(), self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|err| classify(&err))?;

        let status = res.status();
        // NOTE: The body must be fully read for the latency to cover the whole response.
        res.bytes().await.map_err(|err| classify(&err))?;

        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Status(status.as_u16()))
        }
    }
}

fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if let Some(status) = err.status() {
        TransportError::Status(status.as_u16())
    } else {
        TransportError::Request(err.to_string())
    }
}
