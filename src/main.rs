//! Command-line entry point for the piste bridge
//!
//! Reads the apparatus on a serial port (or replays a capture) and serves the
//! decoded snapshot over HTTP until interrupted.
//!
//! ```bash
//! piste-bridge --port /dev/ttyUSB0 --listen 0.0.0.0:8080
//! piste-bridge --config bridge.yaml --no-log-file
//! piste-bridge --replay bout.bin
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use piste_bridge::{BridgeConfig, IngestOptions, PisteBridge, spawn_status_server};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "piste-bridge")]
#[command(about = "Serve fencing apparatus data as JSON", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port of the apparatus
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long)]
    baud: Option<u32>,

    /// Address for the status endpoint
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Append every merged snapshot to this file
    #[arg(long, conflicts_with = "no_log_file")]
    log_file: Option<PathBuf>,

    /// Disable the diagnostic log
    #[arg(long)]
    no_log_file: bool,

    /// Replay a raw byte capture instead of opening the serial port
    #[arg(long)]
    replay: Option<PathBuf>,
}

impl Cli {
    fn resolve_config(&self) -> Result<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => BridgeConfig::default(),
        };

        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(listen) = self.listen {
            config.http.listen = listen;
        }
        if let Some(log_file) = &self.log_file {
            config.diagnostics.log_file = Some(log_file.clone());
        }
        if self.no_log_file {
            config.diagnostics.log_file = None;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let mut connection = match &cli.replay {
        Some(path) => PisteBridge::replay(path, IngestOptions::from(&config))
            .await
            .with_context(|| format!("opening capture {}", path.display()))?,
        None => PisteBridge::connect(&config)
            .await
            .with_context(|| format!("opening serial port {}", config.serial.port))?,
    };

    let server = spawn_status_server(
        config.http.listen,
        &config.http.path,
        connection.reader(),
        connection.cancel_token(),
    )
    .await
    .context("starting status endpoint")?;

    // A finished replay keeps serving its final state; a lost device ends the process
    let live = cli.replay.is_none();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("installing Ctrl+C handler")?;
            info!("Shutdown signal received");
        }
        stats = connection.join(), if live => {
            warn!("Ingestion stopped: {:?}", stats);
        }
    }

    let stats = connection.shutdown().await;
    server.stopped().await;

    if let Some(stats) = stats {
        info!(
            "Processed {} bytes: {} messages decoded, {} unrecognized, {} faults",
            stats.bytes, stats.decoded, stats.unrecognized, stats.faults
        );
    }
    Ok(())
}
