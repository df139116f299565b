//! Identity server binary.
//!
//! ```text
//! identity-server [--config <path>] [--check]
//! ```
//!
//! Loads the configuration, assembles the pipeline (which runs the signing
//! certificate diagnostics) and serves until SIGINT or SIGTERM.

use std::path::PathBuf;

use clap::Parser;

use identity_server::config::{load_config, ServerConfig, ServerOptions};
use identity_server::observability::{init_logging, init_metrics};
use identity_server::pipeline::{PipelineBuilder, UseIdentityServer};
use identity_server::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "identity-server")]
#[command(about = "OpenID Connect identity server", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Assemble the pipeline and run startup diagnostics, then exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "identity-server starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        require_ssl = config.require_ssl,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = config.listener.clone();
    let options = ServerOptions::from_config(config)?;

    let mut app = PipelineBuilder::new();
    app.use_identity_server(options)?;

    if cli.check {
        tracing::info!(stages = app.len(), "Startup check complete");
        return Ok(());
    }

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    HttpServer::new(app.build(), listener)
        .run(shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
