//! Gatekeeper demo server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ rate gate ──▶ basic gate ─────────────────────────────▶ /v1/debug/vars
//!                         │
//!                         └──────▶ bearer gate ──▶ identity resolver ──▶ /v1/users/*
//!                                       │              (cache → store)
//!                                       └──▶ post loader ──▶ ownership/role gate ──▶ /v1/posts/{id}
//! ```
//!
//! Users, roles and posts come from the config's `seed` section and live in
//! memory.

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use gatekeeper::config::{load_config, GatekeeperConfig};
use gatekeeper::observability::{logging, metrics};
use gatekeeper::{AppContext, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(about = "Authentication, authorization and rate admission for an HTTP API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatekeeperConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("gatekeeper v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        cache_enabled = config.cache.enabled,
        rate_limit_enabled = config.rate_limit.enabled,
        request_timeout_secs = config.timeouts.request_secs,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = HttpServer::new(AppContext::in_memory(config));
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
