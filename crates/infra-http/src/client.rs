// Probe client construction
// One pooled reqwest client shared by every probe in the process
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use portprobe_core::application::constants::{
    PROBE_CONNECT_TIMEOUT, PROBE_POOL_MAX_IDLE_PER_HOST, PROBE_TCP_KEEPALIVE,
};
use portprobe_core::port::{TransportError, PROXY_HOST_HEADER, PROXY_HOST_L2};

/// Maps an outgoing request URL to the upstream proxy it must go through
///
/// Returning `None` sends the request directly.
pub type ProxyResolver = Arc<dyn Fn(&Url) -> Option<Url> + Send + Sync>;

/// Probe client settings
///
/// Tuned for many short requests to many distinct virtual hosts.
#[derive(Clone)]
pub struct ProbeClientConfig {
    pub connect_timeout: Duration,
    pub tcp_keepalive: Duration,
    pub pool_max_idle_per_host: usize,
    /// Upstream proxy selection; `None` disables proxies entirely
    pub proxy: Option<ProxyResolver>,
}

impl ProbeClientConfig {
    /// Route every probe through a custom resolver
    pub fn with_proxy_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&Url) -> Option<Url> + Send + Sync + 'static,
    {
        self.proxy = Some(Arc::new(resolver));
        self
    }

    /// Route every probe through a fixed upstream proxy
    ///
    /// # Errors
    /// - TransportError::Build if `proxy_url` is not a valid URL
    pub fn with_upstream_proxy(self, proxy_url: &str) -> Result<Self, TransportError> {
        let upstream = Url::parse(proxy_url).map_err(|e| {
            TransportError::Build(format!("invalid upstream proxy '{}': {}", proxy_url, e))
        })?;
        Ok(self.with_proxy_resolver(move |_| Some(upstream.clone())))
    }
}

impl Default for ProbeClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: PROBE_CONNECT_TIMEOUT,
            tcp_keepalive: PROBE_TCP_KEEPALIVE,
            pool_max_idle_per_host: PROBE_POOL_MAX_IDLE_PER_HOST,
            proxy: None,
        }
    }
}

impl std::fmt::Debug for ProbeClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeClientConfig")
            .field("connect_timeout", &self.connect_timeout)
            .field("tcp_keepalive", &self.tcp_keepalive)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("proxy", &self.proxy.as_ref().map(|_| "<resolver>"))
            .finish()
    }
}

/// Build the pooled HTTP client used for agent probes
///
/// Every request carries the `X-Proxy-Host: l2` routing header.
pub fn build_probe_client(config: &ProbeClientConfig) -> Result<Client, TransportError> {
    let header = HeaderName::from_bytes(PROXY_HOST_HEADER.as_bytes())
        .map_err(|e| TransportError::Build(e.to_string()))?;
    let mut headers = HeaderMap::new();
    headers.insert(header, HeaderValue::from_static(PROXY_HOST_L2));

    let builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .tcp_keepalive(config.tcp_keepalive)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .default_headers(headers);

    let builder = match &config.proxy {
        Some(resolver) => {
            let resolver = Arc::clone(resolver);
            builder.proxy(Proxy::custom(move |url| resolver(url)))
        }
        // Ignore HTTP_PROXY & co: probe routing is configured explicitly
        None => builder.no_proxy(),
    };

    let client = builder
        .build()
        .map_err(|e| TransportError::Build(e.to_string()))?;

    debug!(config = ?config, "Probe client built");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_probe_constants() {
        let config = ProbeClientConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.tcp_keepalive, Duration::from_secs(30));
        assert_eq!(config.pool_max_idle_per_host, 5);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_upstream_proxy_resolves_every_url() {
        let config = ProbeClientConfig::default()
            .with_upstream_proxy("http://10.1.0.1:8443")
            .unwrap();
        let resolver = config.proxy.clone().unwrap();

        let target = Url::parse("http://ip10-0-0-5-s1-4401/").unwrap();
        assert_eq!(
            resolver(&target).map(|u| u.to_string()),
            Some("http://10.1.0.1:8443/".to_string())
        );
    }

    #[test]
    fn test_invalid_upstream_proxy_is_rejected() {
        let err = ProbeClientConfig::default()
            .with_upstream_proxy("not a url")
            .unwrap_err();
        assert!(matches!(err, TransportError::Build(_)));
    }

    #[test]
    fn test_debug_hides_resolver() {
        let config = ProbeClientConfig::default().with_proxy_resolver(|_| None);
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("<resolver>"));
    }

    #[test]
    fn test_build_client() {
        assert!(build_probe_client(&ProbeClientConfig::default()).is_ok());
        let proxied = ProbeClientConfig::default().with_proxy_resolver(|_| None);
        assert!(build_probe_client(&proxied).is_ok());
    }
}
