// Portprobe Infrastructure - HTTP Adapter
// Implements: ProbeTransport

pub mod client;
pub mod transport;

pub use client::{build_probe_client, ProbeClientConfig, ProxyResolver};
pub use transport::ReqwestTransport;
