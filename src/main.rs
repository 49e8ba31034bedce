//! CRConfig Monitor (v1)
//!
//! Publishes the CRConfig of the configured CDN, or the multi-CDN envelope
//! when several CDNs are managed, for Traffic Routers to poll.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                 CRCONFIG MONITOR                  │
//!                      │                                                   │
//!   GET /publish/      │  ┌─────────┐    ┌───────────┐    ┌────────────┐  │
//!   CrConfig ──────────┼─▶│  http   │───▶│ crconfig  │───▶│ aggregator │  │
//!                      │  │ server  │    │  router   │    │ (≥2 CDNs)  │  │
//!                      │  └─────────┘    └─────┬─────┘    └─────┬──────┘  │
//!                      │                       │                │         │
//!                      │                       ▼                ▼         │
//!                      │                 ┌──────────────────────────┐     │      Traffic Ops
//!                      │                 │         session          │─────┼────▶ (or a directory
//!                      │                 └──────────────────────────┘     │      of CRConfigs)
//!                      │                                                   │
//!                      │  ┌──────────┐ ┌───────────┐ ┌──────────────────┐ │
//!                      │  │  config  │ │ lifecycle │ │  observability   │ │
//!                      │  │ + reload │ │ shutdown  │ │ logs + metrics   │ │
//!                      │  └──────────┘ └───────────┘ └──────────────────┘ │
//!                      └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crconfig_monitor::config::load_config;
use crconfig_monitor::config::watcher::ConfigWatcher;
use crconfig_monitor::http::HttpServer;
use crconfig_monitor::lifecycle::{signals, startup, Shutdown};
use crconfig_monitor::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "crconfig-monitor")]
#[command(about = "Publishes single- or multi-CDN CRConfig snapshots", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "/etc/crconfig-monitor/config.toml")]
    config: PathBuf,

    /// Do not reload the configuration when the file changes.
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);

    tracing::info!("crconfig-monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = ?args.config,
        bind_address = %config.listener.bind_address,
        cdn_name = %config.operations.cdn_name,
        managed_cdns = config.operations.managed_cdns.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let session = startup::build_session(&config, &shutdown)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher stops when dropped, so it lives until main returns.
    let (_watcher, config_updates) = if args.no_watch {
        let (_, rx) = mpsc::unbounded_channel();
        (None, rx)
    } else {
        let (watcher, rx) = ConfigWatcher::new(&args.config, config.clone());
        match watcher.run() {
            Ok(w) => (Some(w), rx),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable, reload disabled");
                (None, rx)
            }
        }
    };

    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let server = HttpServer::new(config, session);
    server.run(listener, config_updates, shutdown.clone()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
