// Domain Layer - Pure business logic and entities

pub mod error;
pub mod event;
pub mod instance;
pub mod virtual_host;

// Re-exports
pub use error::DomainError;
pub use event::{Event, EventType, SystemPorts, CHECK_SYSTEM_PORTS_EVENT};
pub use instance::{Instance, InstanceKey, PortNumber};
pub use virtual_host::{decode_host, encode_host, DecodedHost, HostOptions};
