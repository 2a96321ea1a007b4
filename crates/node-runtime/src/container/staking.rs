//! Service wiring and the simulated epoch step.

use std::sync::Arc;

use anyhow::{Context, Result};
use qc_18_staking::adapters::{
    InMemoryLedger, InMemoryPerformanceTracker, InMemoryRewardSink, InMemoryVoteMirror,
    StaticStakeConfig,
};
use qc_18_staking::{
    EpochReport, GenesisMismatch, ManagerDependencies, RouterDependencies, StakeConfig,
    StakeRouter, StakingResult, ValidatorManager, SUBSYSTEM_NAME,
};
use quantum_telemetry::{log_epoch_event, log_validator_event};
use rand::Rng;
use tracing::{debug, info};

use super::config::NodeConfig;
use crate::genesis::GenesisConfig;

pub type Manager =
    ValidatorManager<StaticStakeConfig, InMemoryPerformanceTracker, InMemoryRewardSink>;
pub type Router = StakeRouter<
    StaticStakeConfig,
    InMemoryPerformanceTracker,
    InMemoryRewardSink,
    InMemoryVoteMirror,
    InMemoryLedger,
>;

/// All staking services of one node.
pub struct StakingContainer {
    pub config: NodeConfig,
    pub stake_config: Arc<StaticStakeConfig>,
    pub performance: Arc<InMemoryPerformanceTracker>,
    pub reward_sink: Arc<InMemoryRewardSink>,
    pub vote_mirror: Arc<InMemoryVoteMirror>,
    pub ledger: Arc<InMemoryLedger>,
    pub manager: Arc<Manager>,
    pub router: Arc<Router>,
}

impl StakingContainer {
    pub fn new(config: NodeConfig, stake_config: StakeConfig) -> StakingResult<Self> {
        let stake_config = Arc::new(StaticStakeConfig::new(stake_config)?);
        let performance = Arc::new(InMemoryPerformanceTracker::new());
        let reward_sink = Arc::new(InMemoryRewardSink::new());
        let vote_mirror = Arc::new(InMemoryVoteMirror::new());
        let ledger = Arc::new(InMemoryLedger::new());

        let manager = Arc::new(ValidatorManager::new(ManagerDependencies {
            config: Arc::clone(&stake_config),
            performance: Arc::clone(&performance),
            reward_sink: Arc::clone(&reward_sink),
        }));
        let router = Arc::new(StakeRouter::new(RouterDependencies {
            manager: Arc::clone(&manager),
            vote_mirror: Arc::clone(&vote_mirror),
            transfer: Arc::clone(&ledger),
            pause_authority: config.pause_authority,
        }));

        Ok(Self {
            config,
            stake_config,
            performance,
            reward_sink,
            vote_mirror,
            ledger,
            manager,
            router,
        })
    }

    /// Seed the validator set from `genesis` and check the result against
    /// it. Returns the mismatches found, if any.
    pub fn bootstrap(&self, genesis: &GenesisConfig) -> Result<Vec<GenesisMismatch>> {
        let validators = genesis.parse().context("Failed to parse genesis")?;
        self.manager
            .initialize_genesis(&validators)
            .context("Failed to initialize genesis validator set")?;

        for record in self.manager.validator_set().active_validators {
            log_validator_event!(
                info,
                SUBSYSTEM_NAME,
                "Genesis validator active",
                record.validator,
                voting_power = record.voting_power,
                index = ?record.validator_index
            );
        }
        let genesis_events = self.manager.take_events();
        debug!(events = genesis_events.len(), "Genesis events drained");

        Ok(self.manager.verify_genesis(&validators))
    }

    /// Simulate block production for one epoch, then run the epoch pass.
    ///
    /// Each block picks a proposer from the active set; successful blocks
    /// deposit the configured block reward.
    pub fn run_epoch<R: Rng + ?Sized>(&self, rng: &mut R) -> StakingResult<EpochReport> {
        let epoch = &self.config.epoch;
        let active = self.manager.active_set();
        let mut produced = 0u64;

        if !active.is_empty() {
            for _ in 0..epoch.blocks_per_epoch {
                let proposer = active[rng.gen_range(0..active.len())];
                let successful = rng.gen_range(0..100u8) >= epoch.proposal_failure_percent;
                self.performance.record_proposal(proposer, successful);
                if successful {
                    produced += 1;
                    if epoch.block_reward > 0 {
                        self.manager.deposit_block_reward(epoch.block_reward)?;
                    }
                }
            }
        }

        let report = self.manager.on_new_epoch()?;
        let events = self.manager.take_events();
        log_epoch_event!(
            info,
            SUBSYSTEM_NAME,
            "Epoch advanced",
            report.new_epoch,
            blocks = produced,
            active = report.active_set.len(),
            total_voting_power = report.total_voting_power,
            events = events.len()
        );
        if report.forwarded_to_sink > 0 {
            info!(
                amount = report.forwarded_to_sink,
                sink_total = self.reward_sink.total(),
                "Unearned rewards forwarded to sink"
            );
        }
        Ok(report)
    }
}
