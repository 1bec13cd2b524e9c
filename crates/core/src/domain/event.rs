// Event Domain Model

use serde::{Deserialize, Serialize};

use super::instance::PortNumber;

/// Event type published when an instance reports its open ports
pub const CHECK_SYSTEM_PORTS_EVENT: &str = "instance system ports";

/// Event type tag (routing key on the event bus)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventType(String);

impl EventType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn check_system_ports() -> Self {
        Self::new(CHECK_SYSTEM_PORTS_EVENT)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable domain event handed to the event publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub session_id: String,
    pub payload: serde_json::Value,
}

impl Event {
    /// Build an event from any serializable payload
    pub fn new<P: Serialize>(
        event_type: EventType,
        session_id: impl Into<String>,
        payload: &P,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_type,
            session_id: session_id.into(),
            payload: serde_json::to_value(payload)?,
        })
    }
}

/// Open ports reported by an instance's agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPorts {
    pub instance: String,
    pub ports: Vec<PortNumber>,
}
