// Probe Transport Port
// Abstraction over the HTTP client that talks to in-instance agents

use async_trait::async_trait;
use thiserror::Error;

/// Header telling the shared proxy which internal layer forwards the request
pub const PROXY_HOST_HEADER: &str = "X-Proxy-Host";

/// Routing value for the proxy's internal (second) layer
pub const PROXY_HOST_L2: &str = "l2";

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Outgoing agent request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl ProbeRequest {
    /// `GET http://<host>/` carrying the proxy routing header
    ///
    /// # Errors
    /// - TransportError::InvalidRequest if `host` cannot appear in a URL authority
    pub fn agent_get(host: &str) -> Result<Self, TransportError> {
        validate_host(host)?;

        Ok(Self {
            url: format!("http://{}/", host),
            headers: vec![(PROXY_HOST_HEADER.to_string(), PROXY_HOST_L2.to_string())],
        })
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Maximum length of a DNS host name
const MAX_HOST_LEN: usize = 253;

fn validate_host(host: &str) -> Result<(), TransportError> {
    if host.is_empty() {
        return Err(TransportError::InvalidRequest("host cannot be empty".to_string()));
    }
    if host.len() > MAX_HOST_LEN {
        return Err(TransportError::InvalidRequest(format!(
            "host is too long ({} > {})",
            host.len(),
            MAX_HOST_LEN
        )));
    }
    if let Some(c) = host
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')))
    {
        return Err(TransportError::InvalidRequest(format!(
            "host '{}' contains invalid character {:?}",
            host, c
        )));
    }
    Ok(())
}

/// Response whose body has not been read yet
#[async_trait]
pub trait ProbeResponse: Send {
    fn status(&self) -> u16;

    /// Consume the response and read the full body
    async fn bytes(self: Box<Self>) -> Result<Vec<u8>, TransportError>;
}

/// Probe Transport trait
///
/// Implementations:
/// - ReqwestTransport: pooled HTTP client (infra-http)
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    /// Send a request and return once the response head has arrived
    ///
    /// Dropping the returned future aborts the in-flight request.
    ///
    /// # Errors
    /// - TransportError::InvalidRequest if the request cannot be built
    /// - TransportError::Connect / Timeout on network failures
    async fn send(&self, request: ProbeRequest) -> Result<Box<dyn ProbeResponse>, TransportError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Scripted reply for one request
    #[derive(Debug, Clone)]
    pub enum MockReply {
        /// Answer with status and body
        Respond { status: u16, body: Vec<u8> },
        /// Fail to connect
        Refuse(String),
        /// Never answer (for cancellation testing)
        Hang,
    }

    impl MockReply {
        pub fn ok(body: impl Into<Vec<u8>>) -> Self {
            MockReply::Respond {
                status: 200,
                body: body.into(),
            }
        }

        pub fn status(status: u16) -> Self {
            MockReply::Respond {
                status,
                body: Vec::new(),
            }
        }
    }

    /// Transport replaying scripted replies in order
    ///
    /// The last reply repeats once the script is exhausted.
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<MockReply>>,
        requests: Mutex<Vec<ProbeRequest>>,
        body_reads: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<MockReply>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
                body_reads: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn requests(&self) -> Vec<ProbeRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn body_reads(&self) -> usize {
            self.body_reads.load(Ordering::SeqCst)
        }

        fn next_reply(&self) -> MockReply {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front().unwrap()
            } else {
                replies.front().cloned().unwrap_or(MockReply::Hang)
            }
        }
    }

    struct MockResponse {
        status: u16,
        body: Vec<u8>,
        body_reads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ProbeResponse for MockResponse {
        fn status(&self) -> u16 {
            self.status
        }

        async fn bytes(self: Box<Self>) -> Result<Vec<u8>, TransportError> {
            self.body_reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.body)
        }
    }

    #[async_trait]
    impl ProbeTransport for ScriptedTransport {
        async fn send(
            &self,
            request: ProbeRequest,
        ) -> Result<Box<dyn ProbeResponse>, TransportError> {
            self.requests.lock().unwrap().push(request);

            match self.next_reply() {
                MockReply::Respond { status, body } => Ok(Box::new(MockResponse {
                    status,
                    body,
                    body_reads: Arc::clone(&self.body_reads),
                })),
                MockReply::Refuse(msg) => Err(TransportError::Connect(msg)),
                MockReply::Hang => std::future::pending().await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_get_targets_root_with_routing_header() {
        let req = ProbeRequest::agent_get("ip10-0-0-5-s1-4401").unwrap();
        assert_eq!(req.url, "http://ip10-0-0-5-s1-4401/");
        assert_eq!(req.header("x-proxy-host"), Some("l2"));
    }

    #[test]
    fn test_agent_get_rejects_malformed_hosts() {
        assert!(ProbeRequest::agent_get("").is_err());
        assert!(ProbeRequest::agent_get("bad host").is_err());
        assert!(ProbeRequest::agent_get("host/path").is_err());
        assert!(ProbeRequest::agent_get(&"a".repeat(300)).is_err());
    }
}
