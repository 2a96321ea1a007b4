//! Orchestrator state.
//!
//! Every public operation works on a clone of this struct and the clone is
//! committed only when the operation succeeds.

use crate::config::StakeConfig;
use crate::domain::{
    StakePool, StakingError, StakingResult, ValidatorRecord, ValidatorSetData, ValidatorStatus,
};
use crate::events::StakingEvent;
use crate::metrics;
use shared_types::{Address, Amount, Epoch, Timestamp};
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ManagerState {
    pub(crate) validators: BTreeMap<Address, ValidatorRecord>,
    pub(crate) pools: BTreeMap<Address, StakePool>,
    monikers: BTreeMap<String, Address>,
    consensus_keys: BTreeMap<Vec<u8>, Address>,
    operators: BTreeMap<Address, Address>,
    /// Active and pending-inactive validators, in index order
    pub(crate) active_set: Vec<Address>,
    pub(crate) pending_active: Vec<Address>,
    pub(crate) pending_inactive: Vec<Address>,
    pub(crate) set_data: ValidatorSetData,
    /// Joining power admitted this epoch, per validator
    joining: BTreeMap<Address, Amount>,
    pub(crate) epoch: Epoch,
    pub(crate) last_transition_time: Timestamp,
    pub(crate) reward_pool: Amount,
    /// Events of the running transaction
    pub(crate) events: Vec<StakingEvent>,
}

impl ManagerState {
    // === LOOKUPS ===

    pub fn record(&self, validator: &Address) -> StakingResult<&ValidatorRecord> {
        self.validators
            .get(validator)
            .ok_or(StakingError::ValidatorNotRegistered(*validator))
    }

    pub fn record_mut(&mut self, validator: &Address) -> StakingResult<&mut ValidatorRecord> {
        self.validators
            .get_mut(validator)
            .ok_or(StakingError::ValidatorNotRegistered(*validator))
    }

    pub fn pool(&self, validator: &Address) -> StakingResult<&StakePool> {
        self.pools
            .get(validator)
            .ok_or(StakingError::ValidatorNotRegistered(*validator))
    }

    pub fn pool_mut(&mut self, validator: &Address) -> StakingResult<&mut StakePool> {
        self.pools
            .get_mut(validator)
            .ok_or(StakingError::ValidatorNotRegistered(*validator))
    }

    pub fn status(&self, validator: &Address) -> StakingResult<ValidatorStatus> {
        Ok(self.record(validator)?.status)
    }

    /// Validators whose status is exactly `Active`.
    pub fn active_count(&self) -> usize {
        self.active_set
            .iter()
            .filter(|v| {
                self.validators
                    .get(*v)
                    .map_or(false, |r| r.status == ValidatorStatus::Active)
            })
            .count()
    }

    pub fn emit(&mut self, event: StakingEvent) {
        self.events.push(event);
    }

    // === IDENTITY INDEXES ===

    pub fn ensure_identity_free(
        &self,
        moniker: &str,
        consensus_key: &[u8],
        operator: &Address,
    ) -> StakingResult<()> {
        if self.monikers.contains_key(moniker) {
            return Err(StakingError::DuplicateMoniker(moniker.to_string()));
        }
        if let Some(owner) = self.consensus_keys.get(consensus_key) {
            return Err(StakingError::DuplicateConsensusKey(*owner));
        }
        if self.operators.contains_key(operator) {
            return Err(StakingError::DuplicateOperator(*operator));
        }
        Ok(())
    }

    pub fn insert_validator(&mut self, record: ValidatorRecord, pool: StakePool) {
        let validator = record.validator;
        self.monikers.insert(record.moniker.clone(), validator);
        self.consensus_keys
            .insert(record.consensus_public_key.clone(), validator);
        self.operators.insert(record.operator, validator);
        self.pools.insert(validator, pool);
        self.validators.insert(validator, record);
    }

    pub fn rebind_consensus_key(&mut self, validator: &Address, key: Vec<u8>) -> StakingResult<()> {
        if let Some(owner) = self.consensus_keys.get(&key) {
            if owner != validator {
                return Err(StakingError::DuplicateConsensusKey(*owner));
            }
            return Ok(());
        }
        let record = self.record_mut(validator)?;
        let old = std::mem::replace(&mut record.consensus_public_key, key.clone());
        self.consensus_keys.remove(&old);
        self.consensus_keys.insert(key, *validator);
        Ok(())
    }

    /// Returns the previous operator.
    pub fn rebind_operator(
        &mut self,
        validator: &Address,
        operator: Address,
    ) -> StakingResult<Address> {
        if let Some(owner) = self.operators.get(&operator) {
            if owner != validator {
                return Err(StakingError::DuplicateOperator(operator));
            }
            return Ok(operator);
        }
        let record = self.record_mut(validator)?;
        let old = std::mem::replace(&mut record.operator, operator);
        self.operators.remove(&old);
        self.operators.insert(operator, *validator);
        Ok(old)
    }

    // === LIFECYCLE ===

    /// Set a validator's status and record the transition.
    pub fn set_status(
        &mut self,
        validator: &Address,
        to: ValidatorStatus,
        now: Timestamp,
    ) -> StakingResult<ValidatorStatus> {
        let epoch = self.epoch;
        let record = self.record_mut(validator)?;
        let from = std::mem::replace(&mut record.status, to);
        record.update_time = now;
        if to != ValidatorStatus::Active && to != ValidatorStatus::PendingInactive {
            record.validator_index = None;
        }
        self.emit(StakingEvent::ValidatorStatusChanged {
            validator: *validator,
            from,
            to,
            epoch,
        });
        metrics::record_status_transition(to);
        Ok(from)
    }

    /// Count `increase` against this epoch's joining-power budget.
    pub fn admit_joining_power(
        &mut self,
        validator: &Address,
        increase: Amount,
        config: &StakeConfig,
    ) -> StakingResult<()> {
        self.set_data
            .admit_joining_power(increase, config.voting_power_increase_limit)?;
        let entry = self.joining.entry(*validator).or_insert(0);
        *entry = entry.saturating_add(increase);
        Ok(())
    }

    /// Hand back everything `validator` added to the joining-power budget.
    pub fn release_joining_power(&mut self, validator: &Address) {
        if let Some(amount) = self.joining.remove(validator) {
            self.set_data.release_joining_power(amount);
        }
    }

    pub fn reset_joining_power(&mut self) {
        self.joining.clear();
        self.set_data.total_joining_power = 0;
    }

    /// Delegation-triggered growth check. Only validators that are in or
    /// entering the set consume joining power.
    pub fn check_delegation_growth(
        &mut self,
        validator: &Address,
        increase: Amount,
        config: &StakeConfig,
    ) -> StakingResult<()> {
        match self.status(validator)? {
            ValidatorStatus::Active | ValidatorStatus::PendingActive => {
                self.admit_joining_power(validator, increase, config)
            }
            ValidatorStatus::Inactive | ValidatorStatus::PendingInactive => Ok(()),
        }
    }

    /// `PendingActive -> Inactive`, dropping the join request.
    pub fn cancel_join(&mut self, validator: &Address, now: Timestamp) -> StakingResult<()> {
        self.pending_active.retain(|v| v != validator);
        self.release_joining_power(validator);
        self.set_status(validator, ValidatorStatus::Inactive, now)?;
        Ok(())
    }

    /// `Active -> PendingInactive`. Refuses to remove the sole active validator.
    pub fn schedule_exit(&mut self, validator: &Address, now: Timestamp) -> StakingResult<()> {
        if self.active_count() <= 1 {
            return Err(StakingError::LastActiveValidator(*validator));
        }
        self.set_status(validator, ValidatorStatus::PendingInactive, now)?;
        self.pending_inactive.push(*validator);
        Ok(())
    }

    /// Demote a validator whose stake fell under the minimum after its own
    /// withdrawal.
    pub fn enforce_min_self_stake(
        &mut self,
        validator: &Address,
        config: &StakeConfig,
        now: Timestamp,
    ) -> StakingResult<()> {
        let stake = self.pool(validator)?.bonded();
        if stake >= config.min_validator_stake {
            return Ok(());
        }
        match self.status(validator)? {
            ValidatorStatus::Active => {
                if self.active_count() <= 1 {
                    warn!(
                        validator = %validator,
                        stake,
                        minimum = config.min_validator_stake,
                        "Last active validator below minimum stake, keeping it active"
                    );
                    return Ok(());
                }
                self.schedule_exit(validator, now)?;
                info!(validator = %validator, stake, "Validator below minimum stake, leaving at epoch end");
            }
            ValidatorStatus::PendingActive => {
                self.cancel_join(validator, now)?;
                info!(validator = %validator, stake, "Join request dropped, stake below minimum");
            }
            ValidatorStatus::Inactive | ValidatorStatus::PendingInactive => {}
        }
        Ok(())
    }

    /// Store each active-set member's position.
    pub fn reindex_active_set(&mut self) -> StakingResult<()> {
        let order = self.active_set.clone();
        for (index, validator) in order.iter().enumerate() {
            self.record_mut(validator)?.validator_index = Some(index as u64);
        }
        Ok(())
    }
}
