//! Validator set aggregates and the voting-power growth limit.

use super::{StakingError, StakingResult, ValidatorRecord};
use serde::{Deserialize, Serialize};
use shared_types::{Amount, Epoch, Timestamp, U256};

/// Aggregate voting power of the set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSetData {
    pub total_voting_power: Amount,
    /// Power admitted during the current epoch, reset at each boundary
    pub total_joining_power: Amount,
}

impl ValidatorSetData {
    /// Admit `increase` of new power if
    /// `(joining + increase) * 100 <= total * limit_percent`.
    ///
    /// An empty set (zero total power) admits anything.
    pub fn admit_joining_power(
        &mut self,
        increase: Amount,
        limit_percent: u64,
    ) -> StakingResult<()> {
        if self.total_voting_power > 0 {
            let joining = U256::from(self.total_joining_power) + U256::from(increase);
            let lhs = joining * U256::from(100u64);
            let rhs = U256::from(self.total_voting_power) * U256::from(limit_percent);
            if lhs > rhs {
                return Err(StakingError::VotingPowerIncreaseExceeded {
                    joining: self.total_joining_power,
                    increase,
                    total: self.total_voting_power,
                    limit_percent,
                });
            }
        }
        self.total_joining_power = self.total_joining_power.saturating_add(increase);
        Ok(())
    }

    pub fn release_joining_power(&mut self, amount: Amount) {
        self.total_joining_power = self.total_joining_power.saturating_sub(amount);
    }
}

/// Snapshot of the validator set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidatorSetView {
    pub active_validators: Vec<ValidatorRecord>,
    pub pending_active: Vec<ValidatorRecord>,
    pub pending_inactive: Vec<ValidatorRecord>,
    pub total_voting_power: Amount,
    pub total_joining_power: Amount,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EpochInfo {
    pub epoch: Epoch,
    pub last_transition_time: Timestamp,
}
