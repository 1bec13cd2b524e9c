// Application Layer - Use Cases and Business Logic

pub mod cancellation;
pub mod check_system_ports;
pub mod config;
pub mod constants;
pub mod result_cache;
pub mod scheduler;
pub mod task;

// Re-exports
pub use cancellation::{cancel_channel, CancelSource, CancelToken};
pub use check_system_ports::CheckSystemPorts;
pub use config::ProbeConfig;
pub use result_cache::PortsCache;
pub use scheduler::{TaskScheduler, TickReport};
pub use task::InstanceTask;
