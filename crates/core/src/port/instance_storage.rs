// Instance storage and control-plane ports
use async_trait::async_trait;

use crate::domain::Instance;
use crate::error::Result;

/// Read access to the instance records of the lifecycle system
#[async_trait]
pub trait InstanceStorage: Send + Sync {
    /// All instances currently known, in no particular order
    async fn list_instances(&self) -> Result<Vec<Instance>>;

    /// Look up an instance by display name
    async fn find_instance(&self, name: &str) -> Result<Option<Instance>>;
}

/// Instance-management handle (container control plane)
#[async_trait]
pub trait InstanceManager: Send + Sync {
    /// Whether the instance is up and worth probing
    async fn is_running(&self, instance: &Instance) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Fixed instance list; every instance is running unless stopped
    pub struct StaticInstances {
        instances: Vec<Instance>,
        stopped: Mutex<HashSet<String>>,
    }

    impl StaticInstances {
        pub fn new(instances: Vec<Instance>) -> Self {
            Self {
                instances,
                stopped: Mutex::new(HashSet::new()),
            }
        }

        pub fn stop(&self, name: &str) {
            self.stopped.lock().unwrap().insert(name.to_string());
        }
    }

    #[async_trait]
    impl InstanceStorage for StaticInstances {
        async fn list_instances(&self) -> Result<Vec<Instance>> {
            Ok(self.instances.clone())
        }

        async fn find_instance(&self, name: &str) -> Result<Option<Instance>> {
            Ok(self.instances.iter().find(|i| i.name == name).cloned())
        }
    }

    #[async_trait]
    impl InstanceManager for StaticInstances {
        async fn is_running(&self, instance: &Instance) -> bool {
            !self.stopped.lock().unwrap().contains(&instance.name)
        }
    }
}
