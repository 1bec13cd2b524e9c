// Instance Domain Model

use serde::{Deserialize, Serialize};

use super::error::{DomainError, Result};

/// Port number as reported by the in-instance agent (any JSON integer)
pub type PortNumber = i64;

/// Managed compute instance (container or VM) owned by the lifecycle system
///
/// Read-only to the probe: only identity and addressing fields are consumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Display name, unique within the deployment
    pub name: String,
    /// Session (tenant) the instance belongs to
    pub session_id: String,
    /// Network address on the session's private network
    pub ip: String,
}

impl Instance {
    pub fn new(
        name: impl Into<String>,
        session_id: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            session_id: session_id.into(),
            ip: ip.into(),
        }
    }

    /// Cache identity of this instance
    pub fn key(&self) -> InstanceKey {
        InstanceKey {
            session_id: self.session_id.clone(),
            name: self.name.clone(),
        }
    }

    /// Reject records that can never be addressed
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidInstance(
                "instance name cannot be empty".to_string(),
            ));
        }
        if self.session_id.trim().is_empty() {
            return Err(DomainError::InvalidInstance(format!(
                "instance '{}' has no session id",
                self.name
            )));
        }
        if self.ip.trim().is_empty() {
            return Err(DomainError::InvalidInstance(format!(
                "instance '{}' has no address",
                self.name
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}@{})", self.name, self.session_id, self.ip)
    }
}

/// Identity of an instance for caching purposes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub session_id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_uses_session_and_name() {
        let a = Instance::new("node1", "s1", "10.0.0.5");
        let b = Instance::new("node1", "s2", "10.0.0.5");

        assert_ne!(a.key(), b.key());
        assert_eq!(a.key(), Instance::new("node1", "s1", "10.0.0.9").key());
    }

    #[test]
    fn test_validate_rejects_missing_fields() {
        assert!(Instance::new("", "s1", "10.0.0.5").validate().is_err());
        assert!(Instance::new("node1", " ", "10.0.0.5").validate().is_err());

        let err = Instance::new("node1", "s1", "").validate().unwrap_err();
        assert!(err.to_string().contains("no address"));
    }

    #[test]
    fn test_deserialize_from_json() {
        let instance: Instance = serde_json::from_value(serde_json::json!({
            "name": "node1",
            "session_id": "s1",
            "ip": "10.0.0.5"
        }))
        .unwrap();

        assert_eq!(instance, Instance::new("node1", "s1", "10.0.0.5"));
        assert!(instance.validate().is_ok());
    }
}
