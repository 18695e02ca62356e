//! User Service (v1)
//!
//! CRUD user management over HTTP with structured, redacted invocation logs.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ correlation middleware ──▶ handler (boundary logger)
//!                      (X-Correlation-Id)            │
//!                                                    ▼
//!                                            UserService (inner logger)
//!                                                    │
//!                                                    ▼
//!                                             UserRepository
//!
//!     Cross-cutting: config │ observability (correlation, sanitize,
//!                    invocation, logging, metrics) │ lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use user_service::config::{loader::load_config, ServiceConfig};
use user_service::http::HttpServer;
use user_service::lifecycle::Shutdown;
use user_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "user-service")]
#[command(about = "User management service", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!("user-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        log_format = ?config.observability.log_format,
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
    let server = HttpServer::new(config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
