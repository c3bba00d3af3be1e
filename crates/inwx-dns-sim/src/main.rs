//! inwx-dns-sim: serve a scripted DNS zone for propagation testing.

use anyhow::{Context, Result};
use clap::Parser;
use inwx_dns_sim::{SimulatorConfig, SimulatorServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{error, info};

/// Scripted DNS responder command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML file with listen address, zones and scripted records
    #[arg(short, long, env = "INWX_DNS_SIM_CONFIG", default_value = "sim.toml")]
    config: PathBuf,

    /// Override the configured listen address
    #[arg(short, long, env = "INWX_DNS_SIM_LISTEN")]
    listen: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "INWX_DNS_SIM_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mut config = SimulatorConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }

    let server = SimulatorServer::bind(&config)
        .await
        .context("failed to start DNS simulator")?;

    info!(
        addr = %server.local_addr(),
        names = config.records.len(),
        zones = ?config.zones,
        "inwx-dns-sim running"
    );

    server
        .serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("inwx-dns-sim stopped");
    Ok(())
}
