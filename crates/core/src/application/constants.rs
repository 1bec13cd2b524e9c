// Probe constants (no magic values)
use std::time::Duration;

/// Port the in-instance agent listens on for system port reports
pub const AGENT_PORT: u16 = 4401;

/// Maximum number of instances whose last report is remembered
pub const RESULT_CACHE_CAPACITY: usize = 5000;

/// Dial timeout for agent connections (1s)
/// Probes must fail fast when an instance or proxy leg is unreachable
pub const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// TCP keep-alive for pooled agent connections (30s)
pub const PROBE_TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Idle pooled connections kept per virtual host
pub const PROBE_POOL_MAX_IDLE_PER_HOST: usize = 5;

/// Default interval between scheduler ticks (5s)
pub const DEFAULT_SCHEDULE_INTERVAL: Duration = Duration::from_secs(5);

/// Name under which the system ports task is registered
pub const CHECK_SYSTEM_PORTS_TASK: &str = "CheckSystemPorts";
