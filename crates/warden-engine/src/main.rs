//! Sandbox host binary for Warden.
//!
//! Wires the control plane to an in-memory world so the whole system can
//! run without a game server: the registry, the freeze enforcer, the
//! control API, and a handful of scripted players.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `warden-config.yaml` (or `WARDEN_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the Tokio runtime with `server.http_workers` workers
//! 4. Construct the registry, loading persisted notes and sessions
//! 5. Load the auth gate and spawn the control API
//! 6. Join the configured bots and run the tick loop until `Ctrl-C`
//! 7. Disconnect everyone, flush, and stop the API

mod error;
mod host;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warden_api::{AppState, AuthGate, ServerConfig, spawn_api};
use warden_core::audit::TracingAuditSink;
use warden_core::config::{LoggingConfig, WardenConfig};
use warden_core::persistence::DataStore;
use warden_core::queue::action_queue;
use warden_core::registry::StateRegistry;
use warden_core::runner::TickDriver;
use warden_core::sandbox::SandboxWorld;

use crate::error::EngineError;
use crate::host::SandboxHost;

/// Default configuration path, relative to the working directory.
const CONFIG_PATH: &str = "warden-config.yaml";

fn main() -> Result<(), EngineError> {
    let config = load_config()?;
    init_logging(&config.logging)?;
    info!(
        port = config.server.port,
        fallback_port = config.server.fallback_port,
        ticks_per_second = config.simulation.ticks_per_second,
        data_file = %config.storage.data_file.display(),
        "warden-engine starting"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.http_workers.max(1))
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

/// Load configuration, then apply environment overrides.
fn load_config() -> Result<WardenConfig, EngineError> {
    let path = std::env::var_os("WARDEN_CONFIG")
        .map_or_else(|| PathBuf::from(CONFIG_PATH), PathBuf::from);
    let mut config = WardenConfig::load_or_default(&path)?;
    config.apply_env_overrides();
    Ok(config)
}

/// Install the tracing subscriber. `RUST_LOG` wins over the config level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

async fn run(config: WardenConfig) -> Result<(), EngineError> {
    let ticks_per_second = config.simulation.ticks_per_second.max(1);

    // World and registry.
    let world = Arc::new(SandboxWorld::with_ticks_per_second(ticks_per_second));
    let registry = Arc::new(
        StateRegistry::new(world.clone())
            .with_ticks_per_second(ticks_per_second)
            .with_audit_sink(Arc::new(TracingAuditSink))
            .with_store(DataStore::new(&config.storage.data_file)),
    );

    // Control API.
    let (queue, receiver) = action_queue(config.simulation.action_queue_capacity);
    let auth = Arc::new(AuthGate::load(&config.storage.key_file));
    if !auth.is_initialized() {
        warn!("API key not set; every endpoint is open until POST /api/auth/init");
    }
    let state = Arc::new(AppState::new(Arc::clone(&registry), queue, auth));

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut api_shutdown = shutdown_tx.subscribe();
    let server_config = ServerConfig {
        host: config.server.host,
        port: config.server.port,
        fallback_port: config.server.fallback_port,
    };
    let api = spawn_api(&server_config, state, async move {
        let _ = api_shutdown.wait_for(|stop| *stop).await;
    })
    .await?;
    info!(url = %format!("http://{}", api.addr), "Control API ready");

    // Simulation loop.
    let driver = TickDriver::new(Arc::clone(&registry), receiver, config.freeze.epsilon);
    let mut host = SandboxHost::new(world, registry, driver, StdRng::from_os_rng());
    host.join_bots(&config.sandbox.bots);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => warn!(error = %e, "Could not listen for Ctrl-C, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    let period = Duration::from_secs_f64(1.0 / f64::from(ticks_per_second));
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                host.tick();
            }
            _ = shutdown_rx.wait_for(|stop| *stop) => break,
        }
    }

    host.shutdown();
    api.task.abort();
    info!("warden-engine shutdown complete");
    Ok(())
}
