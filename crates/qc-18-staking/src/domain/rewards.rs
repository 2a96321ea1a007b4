//! Performance-weighted reward allocation.

use super::{math, StakingResult};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, U256};

/// Proposal outcomes recorded for a validator during an epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCounts {
    pub successful: u64,
    pub failed: u64,
}

impl ProposalCounts {
    pub fn total(&self) -> u64 {
        self.successful.saturating_add(self.failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardCandidate {
    pub validator: Address,
    pub stake: Amount,
    pub performance: Option<ProposalCounts>,
}

impl RewardCandidate {
    /// `stake * successful / (successful + failed)`, zero without proposals.
    pub fn weight(&self) -> U256 {
        match self.performance {
            Some(counts) if counts.total() > 0 => {
                U256::from(self.stake) * U256::from(counts.successful)
                    / U256::from(counts.total())
            }
            _ => U256::zero(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardAllocation {
    /// Per-validator reward, in candidate order, zero entries omitted
    pub rewards: Vec<(Address, Amount)>,
    pub distributed: Amount,
}

/// Split `pool` across candidates by weight. Returns `None` when the total
/// weight is zero. Truncation dust is not allocated.
pub fn allocate_rewards(
    pool: Amount,
    candidates: &[RewardCandidate],
) -> StakingResult<Option<RewardAllocation>> {
    let weights: Vec<U256> = candidates.iter().map(RewardCandidate::weight).collect();
    let total_weight = weights.iter().fold(U256::zero(), |acc, w| acc + *w);
    if total_weight.is_zero() {
        return Ok(None);
    }

    let mut allocation = RewardAllocation::default();
    for (candidate, weight) in candidates.iter().zip(weights) {
        let share = math::to_amount(U256::from(pool) * weight / total_weight, "reward share")?;
        if share > 0 {
            allocation.rewards.push((candidate.validator, share));
            allocation.distributed += share;
        }
    }
    Ok(Some(allocation))
}
