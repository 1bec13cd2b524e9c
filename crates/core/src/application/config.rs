// Probe configuration

use super::constants::{AGENT_PORT, RESULT_CACHE_CAPACITY};

/// Behavior knobs of the system ports probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Port of the in-instance agent encoded into the virtual host
    pub agent_port: u16,
    /// Capacity of the per-instance result cache
    pub cache_capacity: usize,
    /// Skip the event when the report equals the cached one
    pub suppress_unchanged: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            agent_port: AGENT_PORT,
            cache_capacity: RESULT_CACHE_CAPACITY,
            suppress_unchanged: true,
        }
    }
}
