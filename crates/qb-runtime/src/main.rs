//! # Quantum Ballot Devnet
//!
//! Runs both chains and the bridge in one process, executes the scripted
//! poll lifecycle once, then keeps relaying until Ctrl+C.
//!
//! ```text
//! qb-devnet [config.json]
//! ```
//!
//! `QB_CONFIG` is used when no path argument is given.

use anyhow::{Context, Result};
use qb_runtime::{run_demo, Devnet, RuntimeConfig};
use qb_telemetry::{init_tracing, TelemetryConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("QB_CONFIG").ok())
        .map(PathBuf::from)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(&TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let path = config_path();
    let config = RuntimeConfig::load(path.as_deref()).context("Failed to load runtime config")?;

    info!("===========================================");
    info!("  Quantum Ballot Devnet v{}", env!("CARGO_PKG_VERSION"));
    info!("  L2 {}  <->  L1 {}", config.l2.selector, config.l1.selector);
    info!("===========================================");

    let devnet = Devnet::new(config).context("Failed to wire devnet")?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let relayer = devnet.spawn_relayer(shutdown_rx);

    let report = run_demo(&devnet, Duration::from_secs(10))
        .await
        .context("Demo scenario failed")?;
    info!(
        "Demo report: {}",
        serde_json::to_string(&report).context("Failed to encode demo report")?
    );

    info!("Devnet is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Initiating graceful shutdown...");
    if let Err(e) = shutdown_tx.send(true) {
        error!("Failed to send shutdown signal: {}", e);
    }
    relayer.await.context("Relayer task panicked")?;
    info!("Shutdown complete");
    Ok(())
}
