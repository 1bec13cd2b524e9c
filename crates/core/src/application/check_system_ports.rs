//! CheckSystemPorts - asks an instance's agent which ports are open
//!
//! One invocation is a single request/response cycle through the shared
//! reverse proxy:
//! 1. encode `(session, ip, agent port)` into a virtual host
//! 2. `GET http://<host>/` with the proxy routing header
//! 3. require `200 OK`
//! 4. decode the body as a JSON array of port numbers
//! 5. publish `SystemPorts` on the event bus
//!
//! Every failure is logged and returned; no event is emitted for a failed
//! probe. Retrying is left to the scheduler's next tick.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::application::cancellation::CancelToken;
use crate::application::config::ProbeConfig;
use crate::application::constants::CHECK_SYSTEM_PORTS_TASK;
use crate::application::result_cache::PortsCache;
use crate::application::task::InstanceTask;
use crate::domain::{Event, EventType, HostOptions, Instance, PortNumber, SystemPorts};
use crate::error::{AppError, Result};
use crate::port::{
    EventPublisher, InstanceManager, InstanceStorage, ProbeRequest, ProbeTransport,
    TransportError, VirtualHostEncoder,
};

/// HTTP status the agent answers with on success
const STATUS_OK: u16 = 200;

/// System ports probe
pub struct CheckSystemPorts {
    event: Arc<dyn EventPublisher>,
    // Wired for the lifecycle system's task contract; the probe cycle itself
    // never consults the control plane or instance storage.
    #[allow(dead_code)]
    manager: Arc<dyn InstanceManager>,
    #[allow(dead_code)]
    storage: Arc<dyn InstanceStorage>,
    transport: Arc<dyn ProbeTransport>,
    encoder: Arc<dyn VirtualHostEncoder>,
    cache: Arc<PortsCache>,
    config: ProbeConfig,
}

impl CheckSystemPorts {
    /// Create the probe with all its collaborators
    ///
    /// # Arguments
    /// * `event` - Bus the `SystemPorts` events are published on
    /// * `manager` - Instance-management handle
    /// * `storage` - Instance storage handle
    /// * `transport` - Pooled HTTP transport (see `portprobe-infra-http`)
    /// * `encoder` - Virtual host encoder of the shared proxy
    /// * `cache` - Result cache, owned by this task for the process lifetime
    /// * `config` - Probe configuration
    pub fn new(
        event: Arc<dyn EventPublisher>,
        manager: Arc<dyn InstanceManager>,
        storage: Arc<dyn InstanceStorage>,
        transport: Arc<dyn ProbeTransport>,
        encoder: Arc<dyn VirtualHostEncoder>,
        cache: Arc<PortsCache>,
        config: ProbeConfig,
    ) -> Self {
        debug!(
            agent_port = config.agent_port,
            cache_capacity = cache.capacity(),
            suppress_unchanged = config.suppress_unchanged,
            "System ports task initialized"
        );
        Self {
            event,
            manager,
            storage,
            transport,
            encoder,
            cache,
            config,
        }
    }

    /// Result cache shared with this task
    pub fn cache(&self) -> &Arc<PortsCache> {
        &self.cache
    }

    /// Request/response/publish cycle without cancellation handling
    async fn check(&self, instance: &Instance) -> Result<()> {
        let host = self.encoder.encode(
            &instance.session_id,
            &instance.ip,
            &HostOptions::with_port(self.config.agent_port),
        );

        let request =
            ProbeRequest::agent_get(&host).map_err(|e| AppError::RequestConstruction {
                address: instance.ip.clone(),
                reason: e.to_string(),
            })?;

        debug!(instance = %instance.name, url = %request.url, "Querying system ports");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| transport_error(instance, e))?;

        let status = response.status();
        if status != STATUS_OK {
            return Err(AppError::UnexpectedStatus {
                address: instance.ip.clone(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(instance, e))?;

        let ports: Vec<PortNumber> =
            serde_json::from_slice(&body).map_err(|e| AppError::Decode {
                address: instance.ip.clone(),
                source: e,
            })?;

        self.publish(instance, ports)
    }

    fn publish(&self, instance: &Instance, ports: Vec<PortNumber>) -> Result<()> {
        let payload = SystemPorts {
            instance: instance.name.clone(),
            ports,
        };
        let event = Event::new(
            EventType::check_system_ports(),
            instance.session_id.as_str(),
            &payload,
        )?;

        // Emit under the cache entry so the last event always matches the cached list
        let suppress = self.config.suppress_unchanged;
        let emitted = self
            .cache
            .record_then(instance.key(), &payload.ports, |changed| {
                if changed || !suppress {
                    self.event.emit(event);
                    true
                } else {
                    false
                }
            });

        if emitted {
            debug!(
                instance = %instance.name,
                session_id = %instance.session_id,
                ports = ?payload.ports,
                "System ports published"
            );
        } else {
            debug!(
                instance = %instance.name,
                ports = ?payload.ports,
                "System ports unchanged; suppressing event"
            );
        }
        Ok(())
    }
}

/// Log a probe failure and hand the error back for propagation
fn failed(instance: &Instance, err: AppError) -> AppError {
    warn!(
        instance = %instance.name,
        ip = %instance.ip,
        error = %err,
        "System ports check failed"
    );
    err
}

fn transport_error(instance: &Instance, err: TransportError) -> AppError {
    match err {
        TransportError::InvalidRequest(reason) => AppError::RequestConstruction {
            address: instance.ip.clone(),
            reason,
        },
        source => AppError::Transport {
            address: instance.ip.clone(),
            source,
        },
    }
}

#[async_trait]
impl InstanceTask for CheckSystemPorts {
    fn name(&self) -> &str {
        CHECK_SYSTEM_PORTS_TASK
    }

    async fn run(&self, cancel: &CancelToken, instance: &Instance) -> Result<()> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AppError::Cancelled {
                address: instance.ip.clone(),
            }),
            result = self.check(instance) => result,
        };
        result.map_err(|e| failed(instance, e))
    }
}
