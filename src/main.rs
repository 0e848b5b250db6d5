//! Marketplace access gate.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace ─▶ timeout ─▶ metrics
//!                                                          │
//!                                                          ▼
//!                                   same-origin ─▶ rate limit ─▶ handler
//!                                                                   │
//!                                        SessionGuard ◀─────────────┤
//!                                        (session → user → role)    │
//!                                                                   ▼
//!                                                     points (calculator, ledger)
//!                                                                   │
//!                                                                   ▼
//!                                                              MemoryStore
//! ```
//!
//! The ops API (status, rate-limit windows, balances) runs on its own listener
//! behind a bearer key.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use market_gate::admin::setup_ops_router;
use market_gate::config::{load_config, watcher::apply_updates, watcher::ConfigWatcher, GateConfig};
use market_gate::lifecycle::{shutdown::recv_shutdown, wait_for_signal, Shutdown};
use market_gate::observability::{logging::init_logging, metrics::init_metrics};
use market_gate::{AppState, HttpServer, MemoryStore};

#[derive(Parser)]
#[command(name = "market-gate")]
#[command(about = "Access gate and points service for the marketplace", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "MARKET_GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GateConfig::default(),
    };

    init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "market-gate starting");
    match &args.config {
        Some(path) => tracing::info!(path = %path.display(), "Configuration loaded"),
        None => tracing::warn!("No configuration file given; using defaults"),
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(match &config.storage.seed_path {
        Some(path) => MemoryStore::load_from_file(Path::new(path))?,
        None => MemoryStore::new(None),
    });

    let state = AppState::new(config.clone(), store.clone())?;
    let shutdown = Shutdown::new();

    // The watcher handle must outlive the server.
    let _watcher = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(apply_updates(state.config.clone(), updates, shutdown.subscribe()));
            match watcher.run() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Config hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    let mut tasks = Vec::new();

    if config.admin.enabled {
        let ops_listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %ops_listener.local_addr()?, "Ops API listening");
        let router = setup_ops_router(state.clone());
        let ops_shutdown = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            axum::serve(ops_listener, router)
                .with_graceful_shutdown(recv_shutdown(ops_shutdown))
                .await
        }));
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(state);
    let server_shutdown = shutdown.subscribe();
    tasks.push(tokio::spawn(async move { server.run(listener, server_shutdown).await }));

    wait_for_signal().await;
    shutdown.trigger();

    for task in tasks {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Listener exited with error"),
            Err(e) => tracing::error!(error = %e, "Listener task panicked"),
        }
    }

    if let Err(e) = store.save_to_file() {
        tracing::error!(error = %e, "Failed to persist store");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
