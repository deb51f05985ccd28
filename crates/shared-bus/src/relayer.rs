//! # Relayer
//!
//! Background task that drains the outbox on a fixed interval until told to
//! stop. It never retries dead letters on its own; re-execution is a manual
//! operator action.

use crate::network::BridgeNetwork;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Periodic outbox drainer.
pub struct Relayer {
    network: Arc<BridgeNetwork>,
    poll_interval: Duration,
}

impl Relayer {
    /// Creates a relayer polling every `poll_interval`.
    #[must_use]
    pub fn new(network: Arc<BridgeNetwork>, poll_interval: Duration) -> Self {
        Self {
            network,
            poll_interval,
        }
    }

    /// One relay pass. Returns the number of delivered messages.
    pub fn tick(&self) -> usize {
        let mut delivered = 0;
        for outcome in self.network.relay_all() {
            match outcome {
                Ok(outcome) if outcome.is_delivered() => delivered += 1,
                Ok(_) => {}
                Err(err) => error!("[bridge] relay failed: {}", err),
            }
        }
        if delivered > 0 {
            debug!(delivered, "[bridge] relay pass complete");
        }
        delivered
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_ms = self.poll_interval.as_millis() as u64, "[bridge] relayer started");
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("[bridge] relayer stopped");
    }

    /// Spawns `run` on the current tokio runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
