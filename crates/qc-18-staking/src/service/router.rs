//! User-facing stake router.
//!
//! Every call checks the pause switch, then runs as one manager
//! transaction. Calls that pay value out hold the reentrancy guard. Vote
//! mirror notifications happen after commit and never fail the call.

use super::guard::best_effort;
use super::manager::ValidatorManager;
use crate::domain::{PoolId, StakingError, StakingResult, ValidatorStatus};
use crate::events::StakingEvent;
use crate::ports::{
    PerformanceTracker, RewardSink, StakeConfigProvider, StakeRouterApi, ValueTransfer, VoteMirror,
};
use shared_types::{apply_bps, Address, Amount};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a redelegation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedelegateOutcome {
    /// Value unbonded from the source pool
    pub amount: Amount,
    /// Fee paid into the destination pool
    pub fee: Amount,
    /// Shares minted in the destination pool
    pub shares: Amount,
}

/// Dependencies for StakeRouter
pub struct RouterDependencies<C, P, S, V, T>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
{
    pub manager: Arc<ValidatorManager<C, P, S>>,
    pub vote_mirror: Arc<V>,
    pub transfer: Arc<T>,
    /// Only this address may pause or unpause
    pub pause_authority: Address,
}

pub struct StakeRouter<C, P, S, V, T>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
    V: VoteMirror,
    T: ValueTransfer,
{
    manager: Arc<ValidatorManager<C, P, S>>,
    vote_mirror: Arc<V>,
    transfer: Arc<T>,
    pause_authority: Address,
    paused: AtomicBool,
}

impl<C, P, S, V, T> StakeRouter<C, P, S, V, T>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
    V: VoteMirror,
    T: ValueTransfer,
{
    pub fn new(deps: RouterDependencies<C, P, S, V, T>) -> Self {
        Self {
            manager: deps.manager,
            vote_mirror: deps.vote_mirror,
            transfer: deps.transfer,
            pause_authority: deps.pause_authority,
            paused: AtomicBool::new(false),
        }
    }

    pub fn manager(&self) -> &Arc<ValidatorManager<C, P, S>> {
        &self.manager
    }

    // === PAUSE SWITCH ===

    pub fn pause(&self, caller: Address) -> StakingResult<()> {
        self.ensure_pause_authority(&caller)?;
        self.paused.store(true, Ordering::SeqCst);
        warn!(by = %caller, "Staking router paused");
        Ok(())
    }

    pub fn unpause(&self, caller: Address) -> StakingResult<()> {
        self.ensure_pause_authority(&caller)?;
        self.paused.store(false, Ordering::SeqCst);
        info!(by = %caller, "Staking router unpaused");
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn ensure_pause_authority(&self, caller: &Address) -> StakingResult<()> {
        if *caller != self.pause_authority {
            return Err(StakingError::Unauthorized(*caller));
        }
        Ok(())
    }

    fn preflight(&self, caller: &Address) -> StakingResult<()> {
        if self.is_paused() {
            return Err(StakingError::Paused);
        }
        if *caller == Address::DEAD {
            return Err(StakingError::ReservedAddress(*caller));
        }
        Ok(())
    }

    fn mirror_shares(&self, holder: &Address, pool: &PoolId, shares: Amount) {
        best_effort("vote_mirror.on_shares_changed", || {
            self.vote_mirror.on_shares_changed(holder, pool, shares)
        });
    }

    // === OPERATIONS ===

    pub fn delegate(&self, caller: Address, validator: Address, amount: Amount) -> StakingResult<Amount> {
        self.preflight(&caller)?;
        let now = self.manager.time_source.now();
        let (shares, pool_id, balance) = self.manager.transact("delegate", |state, config| {
            if amount == 0 {
                return Err(StakingError::ZeroAmount);
            }
            if amount < config.min_delegation_change {
                return Err(StakingError::BelowMinimumDelegation {
                    amount,
                    minimum: config.min_delegation_change,
                });
            }
            let counted = state.status(&validator)?.is_current_epoch_validator();
            let pool = state.pool_mut(&validator)?;
            let shares = pool.delegate(caller, amount, counted)?;
            let (pool_id, balance) = (pool.id(), pool.shares_of(&caller));

            state.check_delegation_growth(&validator, amount, config)?;
            state.record_mut(&validator)?.update_time = now;
            state.emit(StakingEvent::Delegated {
                holder: caller,
                validator,
                amount,
                shares,
            });
            Ok((shares, pool_id, balance))
        })?;

        debug!(holder = %caller, validator = %validator, amount, shares, "Delegated");
        self.mirror_shares(&caller, &pool_id, balance);
        Ok(shares)
    }

    pub fn undelegate(&self, caller: Address, validator: Address, shares: Amount) -> StakingResult<Amount> {
        self.preflight(&caller)?;
        let now = self.manager.time_source.now();
        let (amount, pool_id, balance) = self.manager.transact("undelegate", |state, config| {
            state.status(&validator)?;
            let pool = state.pool_mut(&validator)?;
            let amount = pool.unlock(&caller, shares)?;
            let (pool_id, balance) = (pool.id(), pool.shares_of(&caller));

            if caller == validator {
                state.enforce_min_self_stake(&validator, config, now)?;
            }
            state.emit(StakingEvent::Undelegated {
                holder: caller,
                validator,
                shares,
                amount,
            });
            Ok((amount, pool_id, balance))
        })?;

        debug!(holder = %caller, validator = %validator, shares, amount, "Undelegated");
        self.mirror_shares(&caller, &pool_id, balance);
        Ok(amount)
    }

    /// Move up to `amount` of a pending unlock back to active before it
    /// matures.
    pub fn reactivate(&self, caller: Address, validator: Address, amount: Amount) -> StakingResult<Amount> {
        self.preflight(&caller)?;
        let (moved, pool_id, balance) = self.manager.transact("reactivate", |state, config| {
            let pool = state.pool_mut(&validator)?;
            let moved = pool.reactivate_stake(&caller, amount)?;
            let (pool_id, balance) = (pool.id(), pool.shares_of(&caller));
            state.check_delegation_growth(&validator, moved, config)?;
            state.emit(StakingEvent::StakeReactivated {
                holder: caller,
                validator,
                amount: moved,
            });
            Ok((moved, pool_id, balance))
        })?;

        self.mirror_shares(&caller, &pool_id, balance);
        Ok(moved)
    }

    pub fn redelegate(
        &self,
        caller: Address,
        src: Address,
        dst: Address,
        shares: Amount,
        delegate_votes: bool,
    ) -> StakingResult<RedelegateOutcome> {
        self.preflight(&caller)?;
        if src == dst {
            return Err(StakingError::SameValidator(src));
        }
        let now = self.manager.time_source.now();
        let (outcome, src_pool, src_balance, dst_pool, dst_balance) =
            self.manager.transact_guarded("redelegate", |state, config| {
                state.status(&src)?;
                let dst_status = state.status(&dst)?;
                if dst_status != ValidatorStatus::Active && caller != dst {
                    return Err(StakingError::ValidatorNotActive(dst));
                }

                let source = state.pool_mut(&src)?;
                let amount = source.unbond(&caller, shares)?;
                let (src_pool, src_balance) = (source.id(), source.shares_of(&caller));
                if amount < config.min_delegation_change {
                    return Err(StakingError::BelowMinimumDelegation {
                        amount,
                        minimum: config.min_delegation_change,
                    });
                }
                if caller == src {
                    state.enforce_min_self_stake(&src, config, now)?;
                }

                let fee = apply_bps(amount, config.redelegate_fee_rate);
                let epoch = state.epoch;
                let target = state.pool_mut(&dst)?;
                target.add_fee(fee, epoch)?;
                let minted = target.delegate(caller, amount - fee, dst_status.is_current_epoch_validator())?;
                let (dst_pool, dst_balance) = (target.id(), target.shares_of(&caller));

                state.check_delegation_growth(&dst, amount, config)?;
                state.emit(StakingEvent::Redelegated {
                    holder: caller,
                    src,
                    dst,
                    amount,
                    fee,
                    shares: minted,
                });
                let outcome = RedelegateOutcome {
                    amount,
                    fee,
                    shares: minted,
                };
                Ok((outcome, src_pool, src_balance, dst_pool, dst_balance))
            })?;

        info!(
            holder = %caller,
            src = %src,
            dst = %dst,
            amount = outcome.amount,
            fee = outcome.fee,
            "Redelegated"
        );
        self.mirror_shares(&caller, &src_pool, src_balance);
        self.mirror_shares(&caller, &dst_pool, dst_balance);
        if delegate_votes {
            best_effort("vote_mirror.delegate_votes", || {
                self.vote_mirror.delegate_votes(&caller, &dst)
            });
        }
        Ok(outcome)
    }

    pub fn claim(&self, caller: Address, validator: Address) -> StakingResult<Amount> {
        self.preflight(&caller)?;
        let (amount, pool_id, balance) = self.manager.transact_guarded("claim", |state, _| {
            let pool = state.pool_mut(&validator)?;
            let amount = pool.claim(&caller)?;
            let (pool_id, balance) = (pool.id(), pool.shares_of(&caller));
            self.pay_out(&caller, amount)?;
            state.emit(StakingEvent::Claimed {
                holder: caller,
                validator,
                amount,
            });
            Ok((amount, pool_id, balance))
        })?;

        info!(holder = %caller, validator = %validator, amount, "Claimed");
        self.mirror_shares(&caller, &pool_id, balance);
        Ok(amount)
    }

    /// Claim from each listed validator, skipping unknown validators and
    /// those with nothing claimable. One transfer pays the total.
    pub fn claim_batch(&self, caller: Address, validators: &[Address]) -> StakingResult<Amount> {
        self.preflight(&caller)?;
        let (total, touched) = self.manager.transact_guarded("claim_batch", |state, _| {
            let mut total: Amount = 0;
            let mut touched = Vec::new();
            for validator in validators {
                let Ok(pool) = state.pool_mut(validator) else {
                    debug!(validator = %validator, "Skipping unknown validator in batch claim");
                    continue;
                };
                let amount = match pool.claim(&caller) {
                    Ok(amount) => amount,
                    Err(StakingError::NothingToClaim(_)) => continue,
                    Err(err) => return Err(err),
                };
                touched.push((pool.id(), pool.shares_of(&caller)));
                total = total
                    .checked_add(amount)
                    .ok_or(StakingError::ArithmeticOverflow("claim batch"))?;
                state.emit(StakingEvent::Claimed {
                    holder: caller,
                    validator: *validator,
                    amount,
                });
            }
            if total > 0 {
                self.pay_out(&caller, total)?;
            }
            Ok((total, touched))
        })?;

        info!(holder = %caller, validators = validators.len(), total, "Batch claimed");
        for (pool_id, balance) in &touched {
            self.mirror_shares(&caller, pool_id, *balance);
        }
        Ok(total)
    }

    fn pay_out(&self, recipient: &Address, amount: Amount) -> StakingResult<()> {
        self.transfer
            .transfer(recipient, amount)
            .map_err(|reason| StakingError::TransferFailed {
                recipient: *recipient,
                amount,
                reason,
            })
    }
}

impl<C, P, S, V, T> StakeRouterApi for StakeRouter<C, P, S, V, T>
where
    C: StakeConfigProvider,
    P: PerformanceTracker,
    S: RewardSink,
    V: VoteMirror,
    T: ValueTransfer,
{
    fn delegate(&self, caller: Address, validator: Address, amount: Amount) -> StakingResult<Amount> {
        StakeRouter::delegate(self, caller, validator, amount)
    }

    fn undelegate(&self, caller: Address, validator: Address, shares: Amount) -> StakingResult<Amount> {
        StakeRouter::undelegate(self, caller, validator, shares)
    }

    fn reactivate(&self, caller: Address, validator: Address, amount: Amount) -> StakingResult<Amount> {
        StakeRouter::reactivate(self, caller, validator, amount)
    }

    fn redelegate(
        &self,
        caller: Address,
        src: Address,
        dst: Address,
        shares: Amount,
        delegate_votes: bool,
    ) -> StakingResult<RedelegateOutcome> {
        StakeRouter::redelegate(self, caller, src, dst, shares, delegate_votes)
    }

    fn claim(&self, caller: Address, validator: Address) -> StakingResult<Amount> {
        StakeRouter::claim(self, caller, validator)
    }

    fn claim_batch(&self, caller: Address, validators: &[Address]) -> StakingResult<Amount> {
        StakeRouter::claim_batch(self, caller, validators)
    }
}
