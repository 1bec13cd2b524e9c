//! Portprobe Daemon - Main Entry Point
//! Periodically asks every instance which ports it has open and publishes
//! the reports on the in-process event bus.

mod config;
mod logging;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

// Import workspace crates
use portprobe_core::application::{
    cancel_channel, CheckSystemPorts, PortsCache, ProbeConfig, TaskScheduler,
};
use portprobe_core::domain::EventType;
use portprobe_core::port::DirectHostEncoder;
use portprobe_infra_http::{ProbeClientConfig, ReqwestTransport};
use portprobe_infra_local::{BroadcastEventBus, InMemoryInstanceStore};

use config::DaemonConfig;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Grace period for in-flight probes after Ctrl+C
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env().context("Invalid configuration")?;

    // 2. Initialize logging
    let _log_guard = logging::init(config.log_format)?;

    info!("Portprobe v{} starting...", VERSION);

    // 3. Instance records
    let store = Arc::new(InMemoryInstanceStore::new());
    load_instances(&store, &config.instances_file).await?;

    // 4. Setup dependencies (DI wiring)
    let bus = Arc::new(BroadcastEventBus::default());

    let mut client_config = ProbeClientConfig::default();
    if let Some(proxy) = &config.upstream_proxy {
        info!(upstream_proxy = %proxy, "Routing probes through upstream proxy");
        client_config = client_config.with_upstream_proxy(proxy)?;
    }
    let transport = Arc::new(ReqwestTransport::new(&client_config)?);

    let encoder = Arc::new(match &config.host_tld {
        Some(tld) => DirectHostEncoder::with_tld(tld.as_str()),
        None => DirectHostEncoder::new(),
    });

    let probe_config = ProbeConfig {
        suppress_unchanged: !config.emit_unchanged,
        ..ProbeConfig::default()
    };
    let cache = Arc::new(PortsCache::new(probe_config.cache_capacity));

    let check_system_ports = Arc::new(CheckSystemPorts::new(
        bus.clone(),
        store.clone(),
        store.clone(),
        transport,
        encoder,
        cache,
        probe_config,
    ));

    let mut scheduler = TaskScheduler::new(store.clone(), store.clone(), config.interval);
    scheduler.register(check_system_ports);

    // 5. Report published ports
    let mut reports = bus.subscribe_to(EventType::check_system_ports());
    tokio::spawn(async move {
        while let Some(event) = reports.recv().await {
            info!(
                session_id = %event.session_id,
                payload = %event.payload,
                "System ports reported"
            );
        }
    });

    // 6. Start scheduler
    let (cancel_source, cancel_token) = cancel_channel();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(cancel_token).await;
    });

    info!("System ready. Probing instances...");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    cancel_source.cancel();
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, scheduler_handle)
        .await
        .is_err()
    {
        warn!("Scheduler did not stop within the shutdown timeout");
    }

    info!("Shutdown complete.");

    Ok(())
}

/// Load the instance file into `store`
///
/// A missing file starts the daemon with no instances; any other read or
/// parse failure aborts startup.
async fn load_instances(store: &InMemoryInstanceStore, path: &Path) -> Result<usize> {
    let exists = tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("Cannot access instance file {}", path.display()))?;
    if !exists {
        warn!(
            path = %path.display(),
            "No instance file, starting with an empty instance set"
        );
        return Ok(0);
    }

    let count = store
        .load_json_file(path)
        .await
        .with_context(|| format!("Failed to load instance file {}", path.display()))?;
    info!(count, "Instance file loaded");
    Ok(count)
}
