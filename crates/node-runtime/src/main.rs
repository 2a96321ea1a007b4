//! # Quantum-Chain Staking Node
//!
//! Runs the staking subsystem against in-process collaborators.
//!
//! ## Startup Sequence
//!
//! 1. Initialize structured logging
//! 2. Load node configuration and staking parameters (file, then env)
//! 3. Seed the validator set from genesis and verify it
//! 4. Drive the epoch clock until `QC_EPOCHS` is reached or Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};

use node_runtime::{NodeConfig, StakingContainer};
use qc_18_staking::{SUBSYSTEM_ID, SUBSYSTEM_NAME};
use quantum_telemetry::{init_logging, log_event, subsystem_span, TelemetryConfig};

/// The node runtime driving the staking services.
pub struct NodeRuntime {
    container: Arc<StakingContainer>,
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl NodeRuntime {
    pub fn new(container: StakingContainer) -> Self {
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        Self {
            container: Arc::new(container),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Seed genesis and spawn the epoch loop. The returned handle finishes
    /// when the loop stops.
    pub fn start(&self) -> Result<tokio::task::JoinHandle<()>> {
        info!("===========================================");
        info!("  Quantum-Chain Staking Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let genesis = self
            .container
            .config
            .load_genesis()
            .context("Failed to load genesis")?;
        let mismatches = self.container.bootstrap(&genesis)?;
        if !mismatches.is_empty() {
            anyhow::bail!("Genesis verification failed with {} mismatches", mismatches.len());
        }
        info!(
            validators = self.container.manager.active_set().len(),
            total_voting_power = self.container.manager.total_voting_power(),
            "Genesis verified"
        );

        Ok(tokio::spawn(epoch_loop(
            Arc::clone(&self.container),
            self.shutdown_rx.clone(),
        )))
    }

    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        info!(
            epoch = self.container.manager.epoch_info().epoch,
            paid_out = self.container.ledger.total_paid(),
            "Shutdown complete"
        );
    }
}

async fn epoch_loop(container: Arc<StakingContainer>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    let settings = container.config.epoch.clone();
    let mut ticker = tokio::time::interval(Duration::from_millis(settings.interval_ms));
    // First tick completes immediately
    ticker.tick().await;
    let mut rng = StdRng::from_entropy();
    let mut completed = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => {
                info!("Epoch loop received shutdown signal");
                return;
            }
        }

        let span = subsystem_span!("epoch_pass", subsystem = SUBSYSTEM_NAME, completed);
        match span.in_scope(|| container.run_epoch(&mut rng)) {
            Ok(_) => completed += 1,
            // The failed pass rolled back; retry at the next tick
            Err(e) => log_event!(
                warn,
                SUBSYSTEM_NAME,
                "Epoch transition failed",
                error = %e,
                kind = ?e.kind()
            ),
        }
        if settings.max_epochs.is_some_and(|max| completed >= max) {
            info!(epochs = completed, "Epoch limit reached");
            return;
        }
    }
}

/// Load configuration from environment and files.
fn load_container() -> Result<StakingContainer> {
    let config = NodeConfig::from_env();
    config.validate()?;
    let stake_config = config.load_stake_config()?;
    info!(
        min_validator_stake = stake_config.min_validator_stake,
        max_validator_count = stake_config.max_validator_count,
        epoch_interval_ms = config.epoch.interval_ms,
        "Configuration loaded"
    );
    Ok(StakingContainer::new(config, stake_config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let logger = init_logging(&TelemetryConfig::for_subsystem(SUBSYSTEM_ID, SUBSYSTEM_NAME))?;
    info!(service = logger.service_name(), "Logging ready");

    let runtime = NodeRuntime::new(load_container()?);
    let mut epochs = runtime.start()?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = &mut epochs => {}
    }

    runtime.shutdown().await;
    Ok(())
}
