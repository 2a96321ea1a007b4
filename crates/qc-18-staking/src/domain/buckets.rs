//! Lifecycle buckets of a stake pool.
//!
//! Every unit of value held by a pool sits in exactly one bucket. Value
//! only moves between buckets through the operations below, so the pool
//! total is always the sum of the four balances.

use super::{math, StakingError, StakingResult};
use serde::{Deserialize, Serialize};
use shared_types::Amount;

/// Role of a bucket inside a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BucketRole {
    /// Earning and counted in voting power
    Active,
    /// Becomes active at the next epoch boundary
    PendingActive,
    /// Leaving, still counted for the current epoch
    PendingInactive,
    /// Withdrawable
    Inactive,
}

impl BucketRole {
    pub const ALL: [BucketRole; 4] = [
        BucketRole::Active,
        BucketRole::PendingActive,
        BucketRole::PendingInactive,
        BucketRole::Inactive,
    ];

    fn index(self) -> usize {
        match self {
            BucketRole::Active => 0,
            BucketRole::PendingActive => 1,
            BucketRole::PendingInactive => 2,
            BucketRole::Inactive => 3,
        }
    }

    /// Bucket this one rolls into at an epoch boundary.
    pub fn matures_into(self) -> Option<BucketRole> {
        match self {
            BucketRole::PendingActive => Some(BucketRole::Active),
            BucketRole::PendingInactive => Some(BucketRole::Inactive),
            BucketRole::Active | BucketRole::Inactive => None,
        }
    }
}

/// The four balances of a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buckets {
    balances: [Amount; 4],
}

impl Buckets {
    pub fn get(&self, role: BucketRole) -> Amount {
        self.balances[role.index()]
    }

    /// Sum of all buckets. Credits are checked against this sum, so it
    /// cannot overflow.
    pub fn total(&self) -> Amount {
        self.balances.iter().fold(0, |acc, b| acc.saturating_add(*b))
    }

    pub fn credit(&mut self, role: BucketRole, amount: Amount) -> StakingResult<()> {
        math::checked_add(self.total(), amount, "bucket credit")?;
        self.balances[role.index()] += amount;
        Ok(())
    }

    pub fn debit(&mut self, role: BucketRole, amount: Amount) -> StakingResult<()> {
        let available = self.get(role);
        if amount > available {
            return Err(StakingError::InsufficientBucket {
                bucket: role,
                required: amount,
                available,
            });
        }
        self.balances[role.index()] = available - amount;
        Ok(())
    }

    /// Move `amount` from one bucket to another. Pool total is unchanged.
    pub fn shift(&mut self, from: BucketRole, to: BucketRole, amount: Amount) -> StakingResult<()> {
        self.debit(from, amount)?;
        self.balances[to.index()] += amount;
        Ok(())
    }

    /// Debit `amount` from `primary`, spilling the remainder into
    /// `secondary`. Returns how much came from each.
    pub fn debit_with_spill(
        &mut self,
        primary: BucketRole,
        secondary: BucketRole,
        amount: Amount,
    ) -> StakingResult<(Amount, Amount)> {
        let from_primary = amount.min(self.get(primary));
        let from_secondary = amount - from_primary;
        let available = self.get(primary).saturating_add(self.get(secondary));
        if from_secondary > self.get(secondary) {
            return Err(StakingError::InsufficientBucket {
                bucket: primary,
                required: amount,
                available,
            });
        }
        self.debit(primary, from_primary)?;
        self.debit(secondary, from_secondary)?;
        Ok((from_primary, from_secondary))
    }

    /// Epoch boundary: pending-active joins active, pending-inactive
    /// becomes withdrawable.
    pub fn mature(&mut self) {
        for role in BucketRole::ALL {
            if let Some(target) = role.matures_into() {
                let moved = std::mem::take(&mut self.balances[role.index()]);
                self.balances[target.index()] += moved;
            }
        }
    }
}
