//! Stake pool accounting.
//!
//! A pool holds the capital delegated to one validator. Value lives in four
//! [`Buckets`]; ownership of the bonded part (active and pending-active) is
//! tracked by a [`ShareLedger`]. The share price is
//! `bonded / total_shares`, truncated.
//!
//! Unlocking burns shares at the current price and books the value against
//! the holder as an [`UnlockPosition`]. The position follows the
//! pending-inactive bucket into the inactive bucket at the next epoch and
//! is paid out by [`StakePool::claim`].
//!
//! Every mutating operation validates first and mutates after, so a failed
//! call leaves the pool untouched.

use super::{math, BucketRole, Buckets, ShareLedger, StakingError, StakingResult};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use shared_types::{apply_bps, Address, Amount, BasisPoints, Epoch};
use std::collections::BTreeMap;
use std::fmt;

const POOL_ID_TAG: &[u8] = b"qc-18-staking/stake-pool";

/// Deterministic identifier of a validator's pool.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PoolId(pub [u8; 20]);

impl PoolId {
    /// First 20 bytes of `keccak256(tag || validator)`.
    pub fn derive(validator: &Address) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(POOL_ID_TAG);
        hasher.update(validator.as_bytes());
        let digest = hasher.finalize();
        let mut id = [0u8; 20];
        id.copy_from_slice(&digest[..20]);
        Self(id)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolId({self})")
    }
}

/// Unlocked value owned by one holder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockPosition {
    /// In `pending_inactive`, matures at the next epoch
    pub pending: Amount,
    /// In `inactive`, claimable now
    pub withdrawable: Amount,
}

impl UnlockPosition {
    fn is_empty(&self) -> bool {
        self.pending == 0 && self.withdrawable == 0
    }
}

/// Epochs of reward bookkeeping a pool keeps. Older records are dropped.
pub const REWARD_HISTORY_EPOCHS: usize = 64;

/// Per-epoch reward bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardRecord {
    pub reward: Amount,
    pub commission: Amount,
    /// Redelegation fees paid into the pool
    pub fees: Amount,
    /// Bonded value right after the last credit in this epoch
    pub bonded: Amount,
}

/// Result of [`StakePool::distribute_reward`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardOutcome {
    pub commission: Amount,
    pub commission_shares: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePool {
    id: PoolId,
    validator: Address,
    buckets: Buckets,
    shares: ShareLedger,
    unlocks: BTreeMap<Address, UnlockPosition>,
    /// Bonded value baseline above which growth is commissionable
    principal: Amount,
    lifetime_inflow: Amount,
    lifetime_outflow: Amount,
    reward_history: BTreeMap<Epoch, RewardRecord>,
}

impl StakePool {
    pub fn new(validator: Address) -> Self {
        Self {
            id: PoolId::derive(&validator),
            validator,
            buckets: Buckets::default(),
            shares: ShareLedger::default(),
            unlocks: BTreeMap::new(),
            principal: 0,
            lifetime_inflow: 0,
            lifetime_outflow: 0,
            reward_history: BTreeMap::new(),
        }
    }

    // === VIEWS ===

    pub fn id(&self) -> PoolId {
        self.id
    }

    pub fn validator(&self) -> Address {
        self.validator
    }

    pub fn bucket(&self, role: BucketRole) -> Amount {
        self.buckets.get(role)
    }

    /// Sum of all four buckets.
    pub fn total_pooled(&self) -> Amount {
        self.buckets.total()
    }

    /// Value backing the shares: `active + pending_active`. This is also
    /// the stake that counts toward voting power once matured.
    pub fn bonded(&self) -> Amount {
        self.bucket(BucketRole::Active)
            .saturating_add(self.bucket(BucketRole::PendingActive))
    }

    /// Whether the next tick would move any value.
    pub fn has_pending(&self) -> bool {
        self.bucket(BucketRole::PendingActive) > 0 || self.bucket(BucketRole::PendingInactive) > 0
    }

    pub fn total_shares(&self) -> Amount {
        self.shares.total_supply()
    }

    pub fn shares_of(&self, holder: &Address) -> Amount {
        self.shares.balance_of(holder)
    }

    pub fn share_ledger(&self) -> &ShareLedger {
        &self.shares
    }

    pub fn unlock_position(&self, holder: &Address) -> UnlockPosition {
        self.unlocks.get(holder).copied().unwrap_or_default()
    }

    pub fn unlock_positions(&self) -> impl Iterator<Item = (&Address, &UnlockPosition)> {
        self.unlocks.iter()
    }

    pub fn principal(&self) -> Amount {
        self.principal
    }

    pub fn lifetime_inflow(&self) -> Amount {
        self.lifetime_inflow
    }

    pub fn lifetime_outflow(&self) -> Amount {
        self.lifetime_outflow
    }

    pub fn reward_record(&self, epoch: Epoch) -> Option<&RewardRecord> {
        self.reward_history.get(&epoch)
    }

    /// True when the buckets hold exactly what flowed in minus what flowed
    /// out, and unlock positions account for both unbonding buckets.
    pub fn is_conserved(&self) -> bool {
        let net_matches = self
            .lifetime_inflow
            .checked_sub(self.lifetime_outflow)
            .map_or(false, |net| net == self.total_pooled());
        let (pending, withdrawable) = self.unlocks.values().fold((0u128, 0u128), |acc, p| {
            (
                acc.0.saturating_add(p.pending),
                acc.1.saturating_add(p.withdrawable),
            )
        });
        net_matches
            && pending == self.bucket(BucketRole::PendingInactive)
            && withdrawable == self.bucket(BucketRole::Inactive)
    }

    fn is_empty(&self) -> bool {
        self.total_shares() == 0 || self.bonded() == 0
    }

    /// Value of `shares` at the current price.
    pub fn pooled_by_shares(&self, shares: Amount) -> StakingResult<Amount> {
        if self.total_shares() == 0 {
            return Err(StakingError::ZeroTotalShares);
        }
        math::mul_div(shares, self.bonded(), self.total_shares())
    }

    /// Shares worth `amount` at the current price (1:1 for an empty pool).
    pub fn shares_by_pooled(&self, amount: Amount) -> StakingResult<Amount> {
        if self.is_empty() {
            return Ok(amount);
        }
        math::mul_div(amount, self.total_shares(), self.bonded())
    }

    /// Redeemable value of a holder's shares.
    pub fn stake_of(&self, holder: &Address) -> Amount {
        let shares = self.shares_of(holder);
        if shares == 0 {
            return 0;
        }
        self.pooled_by_shares(shares).unwrap_or(0)
    }

    pub fn claimable_of(&self, holder: &Address) -> Amount {
        self.unlock_position(holder).withdrawable
    }

    pub fn pending_inactive_of(&self, holder: &Address) -> Amount {
        self.unlock_position(holder).pending
    }

    // === MUTATIONS ===

    /// Deposit `amount` for `holder`. Lands in `pending_active` when the
    /// validator is already counted in this epoch's voting power.
    pub fn delegate(
        &mut self,
        holder: Address,
        amount: Amount,
        counted_in_current_epoch: bool,
    ) -> StakingResult<Amount> {
        if amount == 0 {
            return Err(StakingError::ZeroAmount);
        }
        let shares = self.shares_by_pooled(amount)?;
        if shares == 0 {
            return Err(StakingError::ZeroSharesMinted(amount));
        }
        let inflow = math::checked_add(self.lifetime_inflow, amount, "pool inflow")?;
        math::checked_add(self.total_shares(), shares, "share mint")?;

        let role = if counted_in_current_epoch {
            BucketRole::PendingActive
        } else {
            BucketRole::Active
        };
        self.buckets.credit(role, amount)?;
        self.shares.mint(holder, shares)?;
        self.lifetime_inflow = inflow;
        self.principal = self.principal.saturating_add(amount);
        Ok(shares)
    }

    /// Burn `shares` and take their value out of the bonded buckets,
    /// active first.
    fn withdraw_bonded(&mut self, holder: &Address, shares: Amount) -> StakingResult<Amount> {
        if shares == 0 {
            return Err(StakingError::ZeroShares);
        }
        let available = self.shares_of(holder);
        if shares > available {
            return Err(StakingError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        let value = self.pooled_by_shares(shares)?;
        if value == 0 {
            return Err(StakingError::ZeroAmount);
        }
        self.buckets
            .debit_with_spill(BucketRole::Active, BucketRole::PendingActive, value)?;
        self.shares.burn(holder, shares)?;
        self.principal = self.principal.saturating_sub(value);
        Ok(value)
    }

    /// Start unbonding. The value is fixed now and waits in
    /// `pending_inactive` until the next epoch.
    pub fn unlock(&mut self, holder: &Address, shares: Amount) -> StakingResult<Amount> {
        let value = self.withdraw_bonded(holder, shares)?;
        self.buckets.credit(BucketRole::PendingInactive, value)?;
        self.unlocks.entry(*holder).or_default().pending += value;
        Ok(value)
    }

    /// Like [`unlock`](Self::unlock) but the value leaves the pool at once.
    /// Only for pool-to-pool moves.
    pub fn unbond(&mut self, holder: &Address, shares: Amount) -> StakingResult<Amount> {
        let value = self.withdraw_bonded(holder, shares)?;
        self.lifetime_outflow = self.lifetime_outflow.saturating_add(value);
        Ok(value)
    }

    /// Pay out everything the holder has matured in `inactive`.
    pub fn claim(&mut self, holder: &Address) -> StakingResult<Amount> {
        let value = self.claimable_of(holder);
        if value == 0 {
            return Err(StakingError::NothingToClaim(self.validator));
        }
        self.buckets.debit(BucketRole::Inactive, value)?;
        self.lifetime_outflow = self.lifetime_outflow.saturating_add(value);
        if let Some(position) = self.unlocks.get_mut(holder) {
            position.withdrawable = 0;
            if position.is_empty() {
                self.unlocks.remove(holder);
            }
        }
        Ok(value)
    }

    /// Cancel up to `amount` of a pending unlock: the value returns to
    /// `active` and shares are minted for it at the current price.
    pub fn reactivate_stake(&mut self, holder: &Address, amount: Amount) -> StakingResult<Amount> {
        if amount == 0 {
            return Err(StakingError::ZeroAmount);
        }
        let moved = amount.min(self.pending_inactive_of(holder));
        if moved == 0 {
            return Err(StakingError::NothingPending(self.validator));
        }
        let shares = self.shares_by_pooled(moved)?;
        if shares == 0 {
            return Err(StakingError::ZeroSharesMinted(moved));
        }
        math::checked_add(self.total_shares(), shares, "share mint")?;

        self.buckets
            .shift(BucketRole::PendingInactive, BucketRole::Active, moved)?;
        self.shares.mint(*holder, shares)?;
        if let Some(position) = self.unlocks.get_mut(holder) {
            position.pending -= moved;
            if position.is_empty() {
                self.unlocks.remove(holder);
            }
        }
        self.principal = self.principal.saturating_add(moved);
        Ok(moved)
    }

    /// Credit an epoch reward and mint commission shares to `beneficiary`.
    ///
    /// Commission applies to growth of bonded value over `principal`.
    pub fn distribute_reward(
        &mut self,
        reward: Amount,
        commission_rate: BasisPoints,
        beneficiary: Address,
        epoch: Epoch,
    ) -> StakingResult<RewardOutcome> {
        if reward == 0 {
            return Ok(RewardOutcome::default());
        }
        let bonded_after = math::checked_add(self.bonded(), reward, "reward")?;
        let inflow = math::checked_add(self.lifetime_inflow, reward, "pool inflow")?;
        let growth = bonded_after.saturating_sub(self.principal);
        let commission = apply_bps(growth, commission_rate).min(growth);
        let commission_shares = if commission > 0 && self.total_shares() > 0 {
            math::mul_div(commission, self.total_shares(), bonded_after)?
        } else {
            0
        };

        self.buckets.credit(BucketRole::Active, reward)?;
        if commission_shares > 0 {
            self.shares.mint(beneficiary, commission_shares)?;
        }
        self.lifetime_inflow = inflow;
        self.principal = bonded_after - commission;

        let record = self.reward_record_mut(epoch);
        record.reward = record.reward.saturating_add(reward);
        record.commission = record.commission.saturating_add(commission);
        record.bonded = bonded_after;

        Ok(RewardOutcome {
            commission,
            commission_shares,
        })
    }

    /// Credit a redelegation fee as plain bonded value. The principal is
    /// left alone, so the fee counts as commissionable growth.
    pub fn add_fee(&mut self, fee: Amount, epoch: Epoch) -> StakingResult<()> {
        if fee == 0 {
            return Ok(());
        }
        let inflow = math::checked_add(self.lifetime_inflow, fee, "pool inflow")?;
        self.buckets.credit(BucketRole::Active, fee)?;
        self.lifetime_inflow = inflow;

        let bonded = self.bonded();
        let record = self.reward_record_mut(epoch);
        record.fees = record.fees.saturating_add(fee);
        record.bonded = bonded;
        Ok(())
    }

    fn reward_record_mut(&mut self, epoch: Epoch) -> &mut RewardRecord {
        if !self.reward_history.contains_key(&epoch) {
            while self.reward_history.len() >= REWARD_HISTORY_EPOCHS {
                self.reward_history.pop_first();
            }
        }
        self.reward_history.entry(epoch).or_default()
    }

    /// Epoch boundary: mature both pending buckets and every unlock
    /// position with them. Safe to call repeatedly.
    pub fn on_new_epoch(&mut self) {
        self.buckets.mature();
        for position in self.unlocks.values_mut() {
            position.withdrawable += std::mem::take(&mut position.pending);
        }
    }
}
