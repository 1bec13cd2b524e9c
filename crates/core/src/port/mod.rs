// Port Layer - Interfaces for external collaborators

pub mod event_publisher;
pub mod instance_storage;
pub mod probe_transport;
pub mod virtual_host_encoder;

// Re-exports
pub use event_publisher::EventPublisher;
pub use instance_storage::{InstanceManager, InstanceStorage};
pub use probe_transport::{
    ProbeRequest, ProbeResponse, ProbeTransport, TransportError, PROXY_HOST_HEADER, PROXY_HOST_L2,
};
pub use virtual_host_encoder::{DirectHostEncoder, VirtualHostEncoder};
