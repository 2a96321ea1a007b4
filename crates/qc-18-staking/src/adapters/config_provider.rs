use crate::config::StakeConfig;
use crate::domain::StakingResult;
use crate::ports::StakeConfigProvider;
use parking_lot::RwLock;

/// Config provider backed by a validated in-memory [`StakeConfig`].
#[derive(Debug)]
pub struct StaticStakeConfig {
    config: RwLock<StakeConfig>,
}

impl StaticStakeConfig {
    pub fn new(config: StakeConfig) -> StakingResult<Self> {
        config.validate()?;
        Ok(Self {
            config: RwLock::new(config),
        })
    }

    pub fn from_json_str(json: &str) -> StakingResult<Self> {
        Self::new(StakeConfig::from_json_str(json)?)
    }

    /// Replace the parameters. Rejected parameter sets leave the old ones
    /// in place.
    pub fn update(&self, config: StakeConfig) -> StakingResult<()> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }
}

impl Default for StaticStakeConfig {
    fn default() -> Self {
        Self {
            config: RwLock::new(StakeConfig::default()),
        }
    }
}

impl StakeConfigProvider for StaticStakeConfig {
    fn stake_config(&self) -> StakeConfig {
        self.config.read().clone()
    }
}
