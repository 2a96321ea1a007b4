//! # Node Configuration
//!
//! Runtime parameters of the staking node. Defaults run a local devnet;
//! every field can be overridden from the environment.
//!
//! | Variable                    | Field                        |
//! |-----------------------------|------------------------------|
//! | `QC_GENESIS_FILE`           | `genesis_file`               |
//! | `QC_STAKE_CONFIG_FILE`      | `stake_config_file`          |
//! | `QC_DEVNET_VALIDATORS`      | `devnet_validators`          |
//! | `QC_PAUSE_AUTHORITY`        | `pause_authority`            |
//! | `QC_EPOCH_INTERVAL_MS`      | `epoch.interval_ms`          |
//! | `QC_EPOCHS`                 | `epoch.max_epochs`           |
//! | `QC_BLOCKS_PER_EPOCH`       | `epoch.blocks_per_epoch`     |
//! | `QC_BLOCK_REWARD`           | `epoch.block_reward`         |
//! | `QC_PROPOSAL_FAILURE_PCT`   | `epoch.proposal_failure_percent` |
//!
//! Staking parameters themselves come from `stake_config_file` plus the
//! `QC_STAKE_*` overrides.

use std::path::PathBuf;
use std::str::FromStr;

use qc_18_staking::{StakeConfig, StakingError, TOKEN};
use shared_types::{Address, Amount};
use thiserror::Error;
use tracing::warn;

use crate::genesis::{GenesisConfig, GenesisError};

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Genesis document; `None` runs the built-in devnet set
    pub genesis_file: Option<PathBuf>,
    /// JSON staking parameters; `None` uses the defaults
    pub stake_config_file: Option<PathBuf>,
    /// Size of the devnet set when no genesis file is given
    pub devnet_validators: usize,
    /// Account allowed to pause the stake router
    pub pause_authority: Address,
    pub epoch: EpochConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            genesis_file: None,
            stake_config_file: None,
            devnet_validators: 4,
            pause_authority: Address::repeat_byte(0xAD),
            epoch: EpochConfig::default(),
        }
    }
}

/// Epoch clock simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochConfig {
    pub interval_ms: u64,
    /// Stop after this many epochs; run until Ctrl+C when `None`
    pub max_epochs: Option<u64>,
    pub blocks_per_epoch: u64,
    /// Reward deposited per produced block
    pub block_reward: Amount,
    /// Chance that a simulated proposal fails, in percent
    pub proposal_failure_percent: u8,
}

impl Default for EpochConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            max_epochs: None,
            blocks_per_epoch: 20,
            block_reward: 2 * TOKEN,
            proposal_failure_percent: 5,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid staking parameters: {0}")]
    Staking(#[from] StakingError),

    #[error(transparent)]
    Genesis(#[from] GenesisError),

    #[error("Invalid epoch settings: {0}")]
    Epoch(String),
}

impl NodeConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("QC_GENESIS_FILE") {
            self.genesis_file = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("QC_STAKE_CONFIG_FILE") {
            self.stake_config_file = Some(PathBuf::from(path));
        }
        override_field(&lookup, "QC_DEVNET_VALIDATORS", &mut self.devnet_validators);
        override_field(&lookup, "QC_PAUSE_AUTHORITY", &mut self.pause_authority);
        override_field(&lookup, "QC_EPOCH_INTERVAL_MS", &mut self.epoch.interval_ms);
        override_field(&lookup, "QC_BLOCKS_PER_EPOCH", &mut self.epoch.blocks_per_epoch);
        override_field(&lookup, "QC_BLOCK_REWARD", &mut self.epoch.block_reward);
        override_field(
            &lookup,
            "QC_PROPOSAL_FAILURE_PCT",
            &mut self.epoch.proposal_failure_percent,
        );
        let mut max_epochs = 0u64;
        override_field(&lookup, "QC_EPOCHS", &mut max_epochs);
        if max_epochs > 0 {
            self.epoch.max_epochs = Some(max_epochs);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epoch.interval_ms == 0 {
            return Err(ConfigError::Epoch("interval_ms must be positive".into()));
        }
        if self.epoch.blocks_per_epoch == 0 {
            return Err(ConfigError::Epoch("blocks_per_epoch must be positive".into()));
        }
        if self.epoch.proposal_failure_percent > 100 {
            return Err(ConfigError::Epoch(format!(
                "proposal_failure_percent {} above 100",
                self.epoch.proposal_failure_percent
            )));
        }
        Ok(())
    }

    /// Staking parameters from file (or defaults) plus `QC_STAKE_*` overrides.
    pub fn load_stake_config(&self) -> Result<StakeConfig, ConfigError> {
        let base = match &self.stake_config_file {
            Some(path) => StakeConfig::from_json_str(&read_file(path)?)?,
            None => StakeConfig::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn load_genesis(&self) -> Result<GenesisConfig, ConfigError> {
        match &self.genesis_file {
            Some(path) => Ok(GenesisConfig::from_file(path)?),
            None => Ok(GenesisConfig::devnet(self.devnet_validators, 10_000)),
        }
    }
}

fn read_file(path: &PathBuf) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn override_field<T, F>(lookup: &F, key: &str, field: &mut T)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *field = value,
            Err(_) => warn!(key, value = %raw, "Ignoring unparseable override"),
        }
    }
}
