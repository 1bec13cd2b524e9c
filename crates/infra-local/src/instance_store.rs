// In-memory instance store
// Implements InstanceStorage + InstanceManager for single-process deployments
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info};

use portprobe_core::domain::Instance;
use portprobe_core::error::{AppError, Result};
use portprobe_core::port::{InstanceManager, InstanceStorage};

/// Instance records held in memory, keyed by display name
#[derive(Default)]
pub struct InMemoryInstanceStore {
    instances: RwLock<HashMap<String, Instance>>,
    stopped: RwLock<HashSet<String>>,
}

impl InMemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an instance
    ///
    /// # Errors
    /// - AppError::Domain if the record has no name, session or address
    pub async fn put(&self, instance: Instance) -> Result<()> {
        instance.validate()?;
        debug!(instance = %instance, "Instance stored");
        self.instances
            .write()
            .await
            .insert(instance.name.clone(), instance);
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Option<Instance> {
        self.stopped.write().await.remove(name);
        self.instances.write().await.remove(name)
    }

    /// Exclude an instance from probing without forgetting it
    pub async fn mark_stopped(&self, name: &str) {
        self.stopped.write().await.insert(name.to_string());
    }

    pub async fn mark_running(&self, name: &str) {
        self.stopped.write().await.remove(name);
    }

    /// Load a JSON array of instances, returning how many were stored
    ///
    /// # Example
    /// ```text
    /// [{"name": "node1", "session_id": "s1", "ip": "10.0.0.5"}]
    /// ```
    ///
    /// # Errors
    /// - AppError::Storage if the file cannot be read
    /// - AppError::Serialization if it is not a JSON instance array
    /// - AppError::Domain if any record is invalid (nothing is stored then)
    pub async fn load_json_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Storage(format!("cannot read {}: {}", path.display(), e)))?;

        let instances: Vec<Instance> = serde_json::from_slice(&raw)?;
        for instance in &instances {
            instance.validate()?;
        }

        let count = instances.len();
        let mut stored = self.instances.write().await;
        for instance in instances {
            stored.insert(instance.name.clone(), instance);
        }

        info!(path = %path.display(), count, "Instances loaded");
        Ok(count)
    }
}

#[async_trait]
impl InstanceStorage for InMemoryInstanceStore {
    async fn list_instances(&self) -> Result<Vec<Instance>> {
        let mut instances: Vec<Instance> = self.instances.read().await.values().cloned().collect();
        instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instances)
    }

    async fn find_instance(&self, name: &str) -> Result<Option<Instance>> {
        Ok(self.instances.read().await.get(name).cloned())
    }
}

#[async_trait]
impl InstanceManager for InMemoryInstanceStore {
    async fn is_running(&self, instance: &Instance) -> bool {
        let known = self.instances.read().await.contains_key(&instance.name);
        known && !self.stopped.read().await.contains(&instance.name)
    }
}
