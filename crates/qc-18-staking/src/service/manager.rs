//! Validator registry and lifecycle orchestrator.

use super::guard::ReentrancyGuard;
use super::state::ManagerState;
use crate::config::StakeConfig;
use crate::domain::{
    validate_consensus_key, validate_moniker, EpochInfo, PoolId, RegistrationParams, StakePool,
    StakingError, StakingResult, ValidatorRecord, ValidatorSetView, ValidatorStatus,
};
use crate::events::StakingEvent;
use crate::metrics;
use crate::ports::{
    PerformanceTracker, RewardSink, StakeConfigProvider, SystemTimeSource, TimeSource,
};
use parking_lot::{Mutex, RwLock};
use shared_types::{Address, Amount, BasisPoints, Timestamp};
use std::sync::Arc;
use tracing::{debug, info};

/// Dependencies for ValidatorManager
pub struct ManagerDependencies<C, P, S> {
    pub config: Arc<C>,
    pub performance: Arc<P>,
    pub reward_sink: Arc<S>,
}

/// Validator registry, lifecycle state machine and epoch orchestrator.
pub struct ValidatorManager<C, P, S>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
{
    pub(crate) config: Arc<C>,
    pub(crate) performance: Arc<P>,
    pub(crate) reward_sink: Arc<S>,
    /// Last committed state
    state: RwLock<ManagerState>,
    /// Serializes transactions
    writer: Mutex<()>,
    /// Events of committed transactions, oldest first
    events: RwLock<Vec<StakingEvent>>,
    guard: ReentrancyGuard,
    pub(crate) time_source: Box<dyn TimeSource>,
}

impl ManagerState {
    /// Create the record and pool for a new `Inactive` validator. Returns
    /// the pool id and the self-stake minted to `caller`.
    pub(crate) fn register(
        &mut self,
        caller: Address,
        params: RegistrationParams,
        value: Amount,
        config: &StakeConfig,
        now: Timestamp,
    ) -> StakingResult<(PoolId, Amount)> {
        if caller == Address::DEAD || caller.is_zero() {
            return Err(StakingError::ReservedAddress(caller));
        }
        if self.validators.contains_key(&caller) {
            return Err(StakingError::ValidatorAlreadyRegistered(caller));
        }
        let required = config.registration_minimum();
        if value < required {
            return Err(StakingError::InsufficientRegistrationStake {
                provided: value,
                required,
            });
        }
        validate_moniker(&params.moniker)?;
        validate_consensus_key(&params.consensus_public_key)?;
        params.commission.validate(config.max_commission_rate)?;

        let operator = params.operator.unwrap_or(caller);
        self.ensure_identity_free(&params.moniker, &params.consensus_public_key, &operator)?;

        let mut pool = StakePool::new(caller);
        pool.delegate(Address::DEAD, config.lock_amount, false)?;
        let self_stake = value - config.lock_amount;
        if self_stake > 0 {
            pool.delegate(caller, self_stake, false)?;
        }
        let pool_id = pool.id();

        let record = ValidatorRecord {
            validator: caller,
            consensus_public_key: params.consensus_public_key,
            moniker: params.moniker,
            commission: params.commission,
            commission_beneficiary: params.commission_beneficiary.unwrap_or(caller),
            status: ValidatorStatus::Inactive,
            pool_id,
            voting_power: 0,
            validator_index: None,
            operator,
            validator_network_addresses: params.validator_network_addresses,
            fullnode_network_addresses: params.fullnode_network_addresses,
            aux_address: params.aux_address,
            registered_at: now,
            update_time: now,
            last_commission_update: None,
        };
        self.insert_validator(record, pool);
        self.emit(StakingEvent::ValidatorRegistered {
            validator: caller,
            operator,
            pool: pool_id,
            initial_stake: self_stake,
        });
        Ok((pool_id, self_stake))
    }
}

impl<C, P, S> ValidatorManager<C, P, S>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
{
    pub fn new(deps: ManagerDependencies<C, P, S>) -> Self {
        Self {
            config: deps.config,
            performance: deps.performance,
            reward_sink: deps.reward_sink,
            state: RwLock::new(ManagerState::default()),
            writer: Mutex::new(()),
            events: RwLock::new(Vec::new()),
            guard: ReentrancyGuard::new(),
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    // === TRANSACTIONS ===

    /// Run `f` on a draft of the state; commit only on success. Refuses to
    /// run from inside a guarded operation on the same thread; other threads
    /// wait on the writer lock.
    pub(crate) fn transact<R, F>(&self, operation: &'static str, f: F) -> StakingResult<R>
    where
        F: FnOnce(&mut ManagerState, &StakeConfig) -> StakingResult<R>,
    {
        if let Err(err) = self.guard.ensure_idle() {
            metrics::record_operation_rejected(operation, err.label());
            return Err(err);
        }
        self.run_transaction(operation, f)
    }

    /// Like [`transact`](Self::transact) but holds the reentrancy guard for
    /// the whole call. Used by operations that move value out.
    pub(crate) fn transact_guarded<R, F>(&self, operation: &'static str, f: F) -> StakingResult<R>
    where
        F: FnOnce(&mut ManagerState, &StakeConfig) -> StakingResult<R>,
    {
        let _entered = match self.guard.enter() {
            Ok(token) => token,
            Err(err) => {
                metrics::record_operation_rejected(operation, err.label());
                return Err(err);
            }
        };
        self.run_transaction(operation, f)
    }

    fn run_transaction<R, F>(&self, operation: &'static str, f: F) -> StakingResult<R>
    where
        F: FnOnce(&mut ManagerState, &StakeConfig) -> StakingResult<R>,
    {
        let _writer = self.writer.lock();
        let config = self.config.stake_config();
        let mut draft = self.state.read().clone();

        match f(&mut draft, &config) {
            Ok(value) => {
                let committed = std::mem::take(&mut draft.events);
                *self.state.write() = draft;
                self.events.write().extend(committed);
                Ok(value)
            }
            Err(err) => {
                debug!(operation, error = %err, "Staking operation rejected");
                metrics::record_operation_rejected(operation, err.label());
                Err(err)
            }
        }
    }

    // === REGISTRATION & LIFECYCLE ===

    /// Register `caller` as a validator, committing `value`.
    ///
    /// `lock_amount` of the value is minted to [`Address::DEAD`] and can
    /// never be withdrawn; the rest is the validator's self-stake.
    pub fn register_validator(
        &self,
        caller: Address,
        params: RegistrationParams,
        value: Amount,
    ) -> StakingResult<PoolId> {
        let now = self.time_source.now();
        self.transact("register_validator", |state, config| {
            let (pool_id, self_stake) = state.register(caller, params, value, config, now)?;
            info!(validator = %caller, pool = %pool_id, self_stake, "Validator registered");
            Ok(pool_id)
        })
    }

    /// `Inactive -> PendingActive`. Caller must be the operator.
    pub fn join_validator_set(&self, caller: Address, validator: Address) -> StakingResult<()> {
        let now = self.time_source.now();
        self.transact("join_validator_set", |state, config| {
            if !config.allow_validator_set_change {
                return Err(StakingError::ValidatorSetChangeDisabled);
            }
            let record = state.record(&validator)?;
            record.ensure_operator(&caller)?;
            if record.status != ValidatorStatus::Inactive {
                return Err(StakingError::InvalidStatus {
                    operation: "join",
                    status: record.status,
                });
            }

            let stake = state.pool(&validator)?.bonded();
            if stake < config.min_validator_stake || stake > config.maximum_stake {
                return Err(StakingError::StakeOutOfBounds {
                    stake,
                    min: config.min_validator_stake,
                    max: config.maximum_stake,
                });
            }

            let current = state.active_set.len() + state.pending_active.len();
            if current as u64 >= config.max_validator_count {
                return Err(StakingError::ValidatorSetFull {
                    current,
                    max: config.max_validator_count,
                });
            }

            state.admit_joining_power(&validator, stake, config)?;
            state.set_status(&validator, ValidatorStatus::PendingActive, now)?;
            state.pending_active.push(validator);

            info!(validator = %validator, stake, "Validator requested to join");
            Ok(())
        })
    }

    /// Leave the set: `PendingActive -> Inactive` or
    /// `Active -> PendingInactive`. Caller must be the operator.
    pub fn leave_validator_set(&self, caller: Address, validator: Address) -> StakingResult<()> {
        let now = self.time_source.now();
        self.transact("leave_validator_set", |state, config| {
            if !config.allow_validator_set_change {
                return Err(StakingError::ValidatorSetChangeDisabled);
            }
            let record = state.record(&validator)?;
            record.ensure_operator(&caller)?;
            let status = record.status;
            match status {
                ValidatorStatus::PendingActive => state.cancel_join(&validator, now)?,
                ValidatorStatus::Active => state.schedule_exit(&validator, now)?,
                status => {
                    return Err(StakingError::InvalidStatus {
                        operation: "leave",
                        status,
                    })
                }
            }
            info!(validator = %validator, "Validator requested to leave");
            Ok(())
        })
    }

    // === SELF-SERVICE UPDATES ===

    /// Change the commission rate, subject to `max_rate`,
    /// `max_change_rate` and the update cooldown.
    pub fn update_commission_rate(
        &self,
        caller: Address,
        validator: Address,
        new_rate: BasisPoints,
    ) -> StakingResult<()> {
        let now = self.time_source.now();
        self.transact("update_commission_rate", |state, config| {
            let record = state.record_mut(&validator)?;
            record.ensure_operator(&caller)?;
            if let Some(last) = record.last_commission_update {
                let next_allowed = last.saturating_add(config.commission_update_cooldown_secs);
                if now < next_allowed {
                    return Err(StakingError::CommissionUpdateTooFrequent { next_allowed });
                }
            }
            record.commission.check_change(new_rate)?;

            let old_rate = record.commission.rate;
            record.commission.rate = new_rate;
            record.last_commission_update = Some(now);
            record.update_time = now;
            state.emit(StakingEvent::CommissionRateUpdated {
                validator,
                old_rate,
                new_rate,
            });
            Ok(())
        })
    }

    pub fn update_consensus_key(
        &self,
        caller: Address,
        validator: Address,
        consensus_public_key: Vec<u8>,
    ) -> StakingResult<()> {
        let now = self.time_source.now();
        self.transact("update_consensus_key", |state, _| {
            state.record(&validator)?.ensure_operator(&caller)?;
            validate_consensus_key(&consensus_public_key)?;
            state.rebind_consensus_key(&validator, consensus_public_key)?;
            state.record_mut(&validator)?.update_time = now;
            state.emit(StakingEvent::ConsensusKeyUpdated { validator });
            Ok(())
        })
    }

    pub fn update_network_addresses(
        &self,
        caller: Address,
        validator: Address,
        validator_network_addresses: Vec<u8>,
        fullnode_network_addresses: Vec<u8>,
    ) -> StakingResult<()> {
        let now = self.time_source.now();
        self.transact("update_network_addresses", |state, _| {
            let record = state.record_mut(&validator)?;
            record.ensure_operator(&caller)?;
            record.validator_network_addresses = validator_network_addresses;
            record.fullnode_network_addresses = fullnode_network_addresses;
            record.update_time = now;
            state.emit(StakingEvent::NetworkAddressesUpdated { validator });
            Ok(())
        })
    }

    /// Hand the operator role to `new_operator`. Only the validator itself
    /// may do this.
    pub fn update_operator(
        &self,
        caller: Address,
        validator: Address,
        new_operator: Address,
    ) -> StakingResult<()> {
        let now = self.time_source.now();
        self.transact("update_operator", |state, _| {
            state.record(&validator)?.ensure_self(&caller)?;
            if new_operator.is_zero() || new_operator == Address::DEAD {
                return Err(StakingError::ReservedAddress(new_operator));
            }
            let old_operator = state.rebind_operator(&validator, new_operator)?;
            state.record_mut(&validator)?.update_time = now;
            state.emit(StakingEvent::OperatorUpdated {
                validator,
                old_operator,
                new_operator,
            });
            Ok(())
        })
    }

    pub fn update_commission_beneficiary(
        &self,
        caller: Address,
        validator: Address,
        beneficiary: Address,
    ) -> StakingResult<()> {
        let now = self.time_source.now();
        self.transact("update_commission_beneficiary", |state, _| {
            let record = state.record_mut(&validator)?;
            record.ensure_self(&caller)?;
            if beneficiary.is_zero() || beneficiary == Address::DEAD {
                return Err(StakingError::ReservedAddress(beneficiary));
            }
            record.commission_beneficiary = beneficiary;
            record.update_time = now;
            state.emit(StakingEvent::CommissionBeneficiaryUpdated {
                validator,
                beneficiary,
            });
            Ok(())
        })
    }

    /// Add block-reward value to the pool distributed at the next epoch.
    /// Returns the new pool size.
    pub fn deposit_block_reward(&self, amount: Amount) -> StakingResult<Amount> {
        self.transact("deposit_block_reward", |state, _| {
            if amount == 0 {
                return Err(StakingError::ZeroAmount);
            }
            state.reward_pool = state
                .reward_pool
                .checked_add(amount)
                .ok_or(StakingError::ArithmeticOverflow("reward pool"))?;
            let reward_pool = state.reward_pool;
            state.emit(StakingEvent::BlockRewardDeposited {
                amount,
                reward_pool,
            });
            Ok(reward_pool)
        })
    }

    // === VIEWS ===

    pub fn stake_config(&self) -> StakeConfig {
        self.config.stake_config()
    }

    pub fn validator(&self, validator: &Address) -> Option<ValidatorRecord> {
        self.state.read().validators.get(validator).cloned()
    }

    pub fn pool(&self, validator: &Address) -> Option<StakePool> {
        self.state.read().pools.get(validator).cloned()
    }

    pub fn validator_status(&self, validator: &Address) -> Option<ValidatorStatus> {
        self.state.read().validators.get(validator).map(|r| r.status)
    }

    pub fn voting_power(&self, validator: &Address) -> Amount {
        self.state
            .read()
            .validators
            .get(validator)
            .map_or(0, |r| r.voting_power)
    }

    pub fn is_current_epoch_validator(&self, validator: &Address) -> bool {
        self.validator_status(validator)
            .map_or(false, ValidatorStatus::is_current_epoch_validator)
    }

    /// Active set in index order (includes pending-inactive members).
    pub fn active_set(&self) -> Vec<Address> {
        self.state.read().active_set.clone()
    }

    pub fn total_voting_power(&self) -> Amount {
        self.state.read().set_data.total_voting_power
    }

    pub fn total_joining_power(&self) -> Amount {
        self.state.read().set_data.total_joining_power
    }

    pub fn reward_pool(&self) -> Amount {
        self.state.read().reward_pool
    }

    pub fn validator_count(&self) -> usize {
        self.state.read().validators.len()
    }

    pub fn validator_set(&self) -> ValidatorSetView {
        let state = self.state.read();
        let records = |addresses: &[Address]| -> Vec<ValidatorRecord> {
            addresses
                .iter()
                .filter_map(|v| state.validators.get(v).cloned())
                .collect()
        };
        let mut active_validators = records(&state.active_set);
        active_validators.retain(|r| r.status == ValidatorStatus::Active);

        ValidatorSetView {
            active_validators,
            pending_active: records(&state.pending_active),
            pending_inactive: records(&state.pending_inactive),
            total_voting_power: state.set_data.total_voting_power,
            total_joining_power: state.set_data.total_joining_power,
        }
    }

    pub fn epoch_info(&self) -> EpochInfo {
        let state = self.state.read();
        EpochInfo {
            epoch: state.epoch,
            last_transition_time: state.last_transition_time,
        }
    }

    /// Drain events of committed transactions.
    pub fn take_events(&self) -> Vec<StakingEvent> {
        std::mem::take(&mut *self.events.write())
    }
}
