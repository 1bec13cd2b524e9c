//! Wiring helpers for the end-to-end tests
//!
//! Builds `CheckSystemPorts` on top of the real reqwest transport, routed
//! through an upstream proxy the test controls.

use std::sync::Arc;

use portprobe_core::application::{CheckSystemPorts, PortsCache, ProbeConfig};
use portprobe_core::domain::Instance;
use portprobe_core::port::instance_storage::mocks::StaticInstances;
use portprobe_core::port::{DirectHostEncoder, EventPublisher};
use portprobe_infra_http::{build_probe_client, ProbeClientConfig, ReqwestTransport};

/// Default probe client settings, routed through `proxy_url`
pub fn client_config_via(proxy_url: &str) -> ProbeClientConfig {
    ProbeClientConfig::default()
        .with_upstream_proxy(proxy_url)
        .unwrap()
}

/// Transport over a client built from `config`
pub fn transport_with(config: &ProbeClientConfig) -> Arc<ReqwestTransport> {
    Arc::new(ReqwestTransport::from_client(
        build_probe_client(config).unwrap(),
    ))
}

/// Transport routing every request through `proxy_url`
pub fn transport_via(proxy_url: &str) -> Arc<ReqwestTransport> {
    transport_with(&client_config_via(proxy_url))
}

/// CheckSystemPorts for `node1` over the given transport
pub fn check_system_ports_with(
    publisher: Arc<dyn EventPublisher>,
    transport: Arc<ReqwestTransport>,
    config: ProbeConfig,
) -> CheckSystemPorts {
    let instances = Arc::new(StaticInstances::new(vec![node1()]));
    CheckSystemPorts::new(
        publisher,
        instances.clone(),
        instances,
        transport,
        Arc::new(DirectHostEncoder::new()),
        Arc::new(PortsCache::new(config.cache_capacity)),
        config,
    )
}

/// CheckSystemPorts for `node1`, routed through `proxy_url`
pub fn check_system_ports(
    publisher: Arc<dyn EventPublisher>,
    proxy_url: &str,
    config: ProbeConfig,
) -> CheckSystemPorts {
    check_system_ports_with(publisher, transport_via(proxy_url), config)
}

pub fn node1() -> Instance {
    Instance::new("node1", "s1", "10.0.0.5")
}
