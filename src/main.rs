//! Backend proxy server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ route table ──▶ BackendHandler
//!                      (request id,                    │
//!                       trace,                         ├─ body provider
//!                       timeout)                       ├─ extenders (auth)
//!                                                      ├─ fetcher ─────────▶ Backend API
//!                                                      └─ transformers
//!     Client Response                                  │
//!     ◀────────────── JSON | normalized error ◀────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use backend_proxy::config::loader;
use backend_proxy::observability::{logging, metrics};
use backend_proxy::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "backend-proxy")]
#[command(about = "Forward authenticated requests to a backend JSON API", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides the config file and API_URL)
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = loader::prepare_config(cli.config.as_deref(), cli.api_url.clone())?;

    logging::init_tracing(&config.observability)?;

    tracing::info!("backend-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    match config.runtime().api_url() {
        Some(api_url) => tracing::info!(api_url = %api_url, "Backend API URL resolved"),
        None => tracing::warn!(
            "API_URL is not set; every backend route will fail with a configuration error"
        ),
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    let server = HttpServer::new(config)?;
    let signal = tokio::spawn(shutdown.clone().trigger_on_ctrl_c());

    server.run(listener, shutdown_rx).await?;
    signal.abort();

    tracing::info!("Shutdown complete");
    Ok(())
}
