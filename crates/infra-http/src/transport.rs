// ProbeTransport implementation backed by reqwest
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::error::Error as StdError;
use tracing::trace;

use portprobe_core::port::{ProbeRequest, ProbeResponse, ProbeTransport, TransportError};

use crate::client::{build_probe_client, ProbeClientConfig};

/// Pooled HTTP transport for agent probes
///
/// Cheap to share: the underlying client is reference counted and its
/// connection pool is safe for concurrent use.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with its own probe client
    ///
    /// # Example
    /// ```ignore
    /// let transport = ReqwestTransport::new(&ProbeClientConfig::default())?;
    /// ```
    pub fn new(config: &ProbeClientConfig) -> Result<Self, TransportError> {
        Ok(Self {
            client: build_probe_client(config)?,
        })
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

struct ReqwestResponse {
    inner: reqwest::Response,
}

#[async_trait]
impl ProbeResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    async fn bytes(self: Box<Self>) -> Result<Vec<u8>, TransportError> {
        self.inner
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|e| TransportError::Body(describe(&e)))
    }
}

#[async_trait]
impl ProbeTransport for ReqwestTransport {
    async fn send(&self, request: ProbeRequest) -> Result<Box<dyn ProbeResponse>, TransportError> {
        let url = Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", request.url, e)))?;

        let mut builder = self.client.get(url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(map_error)?;

        trace!(
            url = %request.url,
            status = response.status().as_u16(),
            "Probe response received"
        );

        Ok(Box::new(ReqwestResponse { inner: response }))
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    let message = describe(&err);
    if err.is_builder() {
        TransportError::InvalidRequest(message)
    } else if err.is_timeout() {
        TransportError::Timeout(message)
    } else if err.is_connect() {
        TransportError::Connect(message)
    } else if err.is_body() || err.is_decode() {
        TransportError::Body(message)
    } else {
        TransportError::Other(message)
    }
}

/// Render an error with its full source chain
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
