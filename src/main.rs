//! Service registry lifecycle host.
//!
//! # Architecture Overview
//!
//! ```text
//!        ┌───────────────────────────────────────────────────────────┐
//!        │                    REGISTRY LIFECYCLE                     │
//!        │                                                           │
//!        │  ┌──────────┐   ┌──────────┐   ┌────────────────────┐     │      Discovery
//!        │  │  config  │──▶│ identity │──▶│ lifecycle manager  │─────┼───▶  registry
//!        │  └──────────┘   └──────────┘   │ register/heartbeat │     │
//!        │                                │    /deregister     │     │
//!        │                                └─────────┬──────────┘     │
//!        │                  ┌───────────┐          │ tick            │
//!        │                  │ scheduler │──────────┘                 │
//!        │                  └───────────┘          │ sweep           │
//!        │                                         ▼                 │
//!        │  ┌──────────┐                  ┌────────────────┐         │      Sibling
//!        │  │   http   │ ◀── probes ──    │    health      │─────────┼───▶  instances
//!        │  │ (/health)│                  │ probe + sweep  │         │
//!        │  └──────────┘                  └────────────────┘         │
//!        └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Startup: config → identity → register → serve.
//! Shutdown: signal → stop scheduler → deregister → stop server.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use registry_lifecycle::config;
use registry_lifecycle::http::server::AppState;
use registry_lifecycle::lifecycle::{signals, startup, Scheduler, Shutdown};
use registry_lifecycle::observability::{logging, metrics};
use registry_lifecycle::HttpServer;

#[derive(Parser)]
#[command(name = "registry-lifecycle")]
#[command(about = "Keeps this service registered with a discovery registry", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, env = "REGISTRY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let loaded = config::load(args.config.as_deref())?;

    logging::init(&loaded.config.observability)?;
    loaded.log_ignored();
    let config = loaded.config;

    tracing::info!("registry-lifecycle v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        registry = %config.registry.url,
        app = %config.registry.app_name,
        port = config.instance.port,
        heartbeat_interval_secs = config.registry.heartbeat_interval_secs,
        probe_timeout_secs = config.probe.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Bound before registering; traffic is served only after registration.
    let listener = TcpListener::bind(config.instance.bind_address()).await?;

    let manager = startup::bootstrap(&config).await?;
    let descriptor = manager.descriptor();

    let shutdown = Shutdown::new();
    let mut scheduler = Scheduler::new(shutdown.clone());
    startup::schedule(
        &mut scheduler,
        manager.clone(),
        config.registry.heartbeat_interval(),
    );
    tracing::info!(tasks = scheduler.len(), "Background tasks started");

    let server = HttpServer::new(AppState {
        app_name: descriptor.app_name().to_string(),
        host_name: descriptor.host_name().to_string(),
    });
    let server_shutdown = shutdown.clone();
    let server_task = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    signals::shutdown_signal().await;
    shutdown.trigger();

    startup::drain(scheduler, &manager).await;

    match server_task.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
        Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
