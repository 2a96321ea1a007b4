//! Once-per-epoch orchestration.
//!
//! Step order:
//!
//! 1. Tick every pool of every set member (snapshot taken first), and
//!    every other pool with pending value.
//! 2. Promote `PendingActive -> Active`.
//! 3. Demote `PendingInactive -> Inactive`.
//! 4. Distribute the block-reward pool by performance weight, using the
//!    voting power of the ending epoch.
//! 5. Recompute voting power, evict validators under the minimum, resum.
//! 6. Notify the performance tracker (best-effort).
//! 7. Reset joining power, advance the epoch.
//!
//! Any failure except step 6 aborts the whole pass.

use super::guard::best_effort;
use super::manager::ValidatorManager;
use super::state::ManagerState;
use crate::config::StakeConfig;
use crate::domain::{allocate_rewards, RewardCandidate, StakingError, StakingResult, ValidatorStatus};
use crate::events::StakingEvent;
use crate::metrics;
use crate::ports::{EpochHandler, PerformanceTracker, RewardSink, StakeConfigProvider};
use serde::Serialize;
use shared_types::{Address, Amount, Epoch, Timestamp};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Outcome of one epoch pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EpochReport {
    pub ended_epoch: Epoch,
    pub new_epoch: Epoch,
    pub promoted: Vec<Address>,
    pub demoted: Vec<Address>,
    /// Dropped in step 5 for stake under the minimum
    pub evicted: Vec<Address>,
    pub rewards: Vec<(Address, Amount)>,
    pub forwarded_to_sink: Amount,
    /// Truncation dust carried into the next epoch
    pub reward_carry: Amount,
    pub active_set: Vec<Address>,
    pub total_voting_power: Amount,
}

impl ManagerState {
    /// Every validator whose pool must tick this epoch: set members plus
    /// any pool still holding pending value, so unlocks from inactive
    /// validators mature too.
    fn epoch_members(&self) -> BTreeSet<Address> {
        let maturing = self
            .pools
            .iter()
            .filter(|(_, pool)| pool.has_pending())
            .map(|(validator, _)| *validator);
        self.active_set
            .iter()
            .chain(&self.pending_active)
            .chain(&self.pending_inactive)
            .copied()
            .chain(maturing)
            .collect()
    }

    fn tick_pools(&mut self, members: &BTreeSet<Address>) -> StakingResult<()> {
        for validator in members {
            self.pool_mut(validator)?.on_new_epoch();
        }
        Ok(())
    }

    fn promote_pending_active(&mut self, now: Timestamp) -> StakingResult<Vec<Address>> {
        let promoted = std::mem::take(&mut self.pending_active);
        for validator in &promoted {
            self.set_status(validator, ValidatorStatus::Active, now)?;
            self.active_set.push(*validator);
        }
        self.reindex_active_set()?;
        Ok(promoted)
    }

    fn demote_pending_inactive(&mut self, now: Timestamp) -> StakingResult<Vec<Address>> {
        let demoted = std::mem::take(&mut self.pending_inactive);
        for validator in &demoted {
            let record = self.record_mut(validator)?;
            let power = std::mem::take(&mut record.voting_power);
            self.set_data.total_voting_power = self.set_data.total_voting_power.saturating_sub(power);
            self.set_status(validator, ValidatorStatus::Inactive, now)?;
            self.active_set.retain(|v| v != validator);
        }
        self.reindex_active_set()?;
        Ok(demoted)
    }

    /// Reward candidates: active validators with their current power.
    fn reward_candidates<P: PerformanceTracker>(&self, tracker: &P) -> Vec<RewardCandidate> {
        self.active_set
            .iter()
            .filter_map(|v| self.validators.get(v))
            .filter(|r| r.status == ValidatorStatus::Active)
            .map(|r| RewardCandidate {
                validator: r.validator,
                stake: r.voting_power,
                performance: tracker.proposal_counts(&r.validator),
            })
            .collect()
    }

    fn credit_rewards(&mut self, rewards: &[(Address, Amount)], epoch: Epoch) -> StakingResult<()> {
        for (validator, reward) in rewards {
            let record = self.record(validator)?;
            let (rate, beneficiary) = (record.commission.rate, record.commission_beneficiary);
            let outcome = self
                .pool_mut(validator)?
                .distribute_reward(*reward, rate, beneficiary, epoch)?;
            self.emit(StakingEvent::RewardDistributed {
                validator: *validator,
                epoch,
                reward: *reward,
                commission: outcome.commission,
            });
        }
        Ok(())
    }

    /// Refresh voting power of the active set from pool balances. Returns
    /// the validators evicted for being under the minimum.
    pub(super) fn recompute_voting_power(
        &mut self,
        config: &StakeConfig,
        now: Timestamp,
    ) -> StakingResult<Vec<Address>> {
        let mut retained = Vec::with_capacity(self.active_set.len());
        let mut evicted = Vec::new();

        for validator in std::mem::take(&mut self.active_set) {
            let stake = self.pool(&validator)?.bonded();
            let record = self.record_mut(&validator)?;
            if stake < config.min_validator_stake {
                record.voting_power = 0;
                evicted.push(validator);
            } else {
                record.voting_power = stake.min(config.maximum_stake);
                retained.push(validator);
            }
        }
        for validator in &evicted {
            self.set_status(validator, ValidatorStatus::Inactive, now)?;
            warn!(validator = %validator, "Validator evicted, stake below minimum");
        }

        self.active_set = retained;
        self.reindex_active_set()?;
        self.set_data.total_voting_power = self
            .active_set
            .iter()
            .filter_map(|v| self.validators.get(v))
            .fold(0, |acc: Amount, r| acc.saturating_add(r.voting_power));
        Ok(evicted)
    }
}

impl<C, P, S> ValidatorManager<C, P, S>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
{
    /// Run the epoch pass as a single transaction.
    pub fn on_new_epoch(&self) -> StakingResult<EpochReport> {
        let now = self.time_source.now();
        let report = self.transact_guarded("on_new_epoch", |state, config| {
            let ended_epoch = state.epoch;

            let members = state.epoch_members();
            state.tick_pools(&members)?;

            let promoted = state.promote_pending_active(now)?;
            let demoted = state.demote_pending_inactive(now)?;

            let (rewards, forwarded_to_sink) = self.settle_rewards(state, ended_epoch)?;

            let evicted = state.recompute_voting_power(config, now)?;

            let active_set = state.active_set.clone();
            best_effort("performance_tracker.on_new_epoch", || {
                self.performance.on_new_epoch(&active_set)
            });

            state.reset_joining_power();
            state.epoch = ended_epoch + 1;
            state.last_transition_time = now;
            state.emit(StakingEvent::EpochTransitioned {
                epoch: state.epoch,
                total_voting_power: state.set_data.total_voting_power,
                active_validators: active_set.len(),
            });

            Ok(EpochReport {
                ended_epoch,
                new_epoch: state.epoch,
                promoted,
                demoted,
                evicted,
                rewards,
                forwarded_to_sink,
                reward_carry: state.reward_pool,
                active_set,
                total_voting_power: state.set_data.total_voting_power,
            })
        })?;

        let distributed: Amount = report.rewards.iter().map(|(_, r)| *r).sum();
        metrics::record_epoch_processed(
            report.total_voting_power,
            distributed,
            report.forwarded_to_sink,
        );
        info!(
            epoch = report.new_epoch,
            active = report.active_set.len(),
            promoted = report.promoted.len(),
            demoted = report.demoted.len(),
            evicted = report.evicted.len(),
            total_voting_power = report.total_voting_power,
            distributed,
            "Epoch transition complete"
        );
        Ok(report)
    }

    /// Step 4: split the reward pool, or forward it when nobody earned it.
    fn settle_rewards(
        &self,
        state: &mut ManagerState,
        epoch: Epoch,
    ) -> StakingResult<(Vec<(Address, Amount)>, Amount)> {
        let pool = state.reward_pool;
        if pool == 0 {
            return Ok((Vec::new(), 0));
        }

        let candidates = state.reward_candidates(self.performance.as_ref());
        match allocate_rewards(pool, &candidates)? {
            Some(allocation) => {
                state.credit_rewards(&allocation.rewards, epoch)?;
                state.reward_pool = pool - allocation.distributed;
                debug!(
                    epoch,
                    distributed = allocation.distributed,
                    carry = state.reward_pool,
                    "Epoch rewards distributed"
                );
                Ok((allocation.rewards, 0))
            }
            None => {
                self.reward_sink
                    .absorb(pool, epoch)
                    .map_err(|reason| StakingError::RewardSinkFailed {
                        amount: pool,
                        reason,
                    })?;
                state.reward_pool = 0;
                state.emit(StakingEvent::RewardForwardedToSink {
                    epoch,
                    amount: pool,
                });
                info!(epoch, amount = pool, "No eligible performance, rewards forwarded to sink");
                Ok((Vec::new(), pool))
            }
        }
    }
}

impl<C, P, S> EpochHandler for ValidatorManager<C, P, S>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
{
    fn on_new_epoch(&self) -> StakingResult<EpochReport> {
        ValidatorManager::on_new_epoch(self)
    }
}
