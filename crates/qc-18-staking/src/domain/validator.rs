//! Validator records and lifecycle status.

use super::{PoolId, StakingError, StakingResult};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount, BasisPoints, Timestamp, BPS_DENOMINATOR};

pub const MIN_MONIKER_LEN: usize = 3;
pub const MAX_MONIKER_LEN: usize = 32;

/// Lifecycle status of a validator.
///
/// ```text
/// Inactive --join--> PendingActive --epoch--> Active --leave--> PendingInactive --epoch--> Inactive
///                    PendingActive --leave--> Inactive
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ValidatorStatus {
    #[default]
    Inactive,
    PendingActive,
    Active,
    PendingInactive,
}

impl ValidatorStatus {
    /// Whether the validator's stake counts in the current epoch's voting power.
    pub fn is_current_epoch_validator(self) -> bool {
        matches!(self, ValidatorStatus::Active | ValidatorStatus::PendingInactive)
    }
}

/// Commission settings, all in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Commission {
    pub rate: BasisPoints,
    pub max_rate: BasisPoints,
    pub max_change_rate: BasisPoints,
}

impl Commission {
    /// `rate <= max_rate <= cap` and `max_change_rate <= max_rate`.
    pub fn validate(&self, cap: BasisPoints) -> StakingResult<()> {
        if self.rate > self.max_rate {
            return Err(StakingError::CommissionRateTooHigh {
                rate: self.rate,
                max_rate: self.max_rate,
            });
        }
        if self.max_rate > cap || cap > BPS_DENOMINATOR {
            return Err(StakingError::InvalidCommission(format!(
                "max rate {} exceeds cap {}",
                self.max_rate,
                cap.min(BPS_DENOMINATOR)
            )));
        }
        if self.max_change_rate > self.max_rate {
            return Err(StakingError::InvalidCommission(format!(
                "max change rate {} exceeds max rate {}",
                self.max_change_rate, self.max_rate
            )));
        }
        Ok(())
    }

    /// Check a rate change against `max_rate` and `max_change_rate`.
    pub fn check_change(&self, new_rate: BasisPoints) -> StakingResult<()> {
        if new_rate > self.max_rate {
            return Err(StakingError::CommissionRateTooHigh {
                rate: new_rate,
                max_rate: self.max_rate,
            });
        }
        let delta = new_rate.abs_diff(self.rate);
        if delta > self.max_change_rate {
            return Err(StakingError::CommissionChangeTooLarge {
                delta,
                max_change_rate: self.max_change_rate,
            });
        }
        Ok(())
    }
}

/// Input to validator registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationParams {
    pub consensus_public_key: Vec<u8>,
    pub moniker: String,
    pub commission: Commission,
    /// Defaults to the validator itself
    pub operator: Option<Address>,
    /// Defaults to the validator itself
    pub commission_beneficiary: Option<Address>,
    pub validator_network_addresses: Vec<u8>,
    pub fullnode_network_addresses: Vec<u8>,
    pub aux_address: Vec<u8>,
}

/// One registered validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub validator: Address,
    pub consensus_public_key: Vec<u8>,
    pub moniker: String,
    pub commission: Commission,
    pub commission_beneficiary: Address,
    pub status: ValidatorStatus,
    pub pool_id: PoolId,
    pub voting_power: Amount,
    /// Position in the active set, `None` outside it
    pub validator_index: Option<u64>,
    pub operator: Address,
    pub validator_network_addresses: Vec<u8>,
    pub fullnode_network_addresses: Vec<u8>,
    pub aux_address: Vec<u8>,
    pub registered_at: Timestamp,
    pub update_time: Timestamp,
    pub last_commission_update: Option<Timestamp>,
}

impl ValidatorRecord {
    pub fn ensure_operator(&self, caller: &Address) -> StakingResult<()> {
        if *caller != self.operator {
            return Err(StakingError::NotOperator {
                caller: *caller,
                validator: self.validator,
            });
        }
        Ok(())
    }

    pub fn ensure_self(&self, caller: &Address) -> StakingResult<()> {
        if *caller != self.validator {
            return Err(StakingError::NotValidator {
                caller: *caller,
                validator: self.validator,
            });
        }
        Ok(())
    }
}

pub fn validate_moniker(moniker: &str) -> StakingResult<()> {
    let len = moniker.chars().count();
    let well_formed = (MIN_MONIKER_LEN..=MAX_MONIKER_LEN).contains(&len)
        && moniker.trim() == moniker
        && moniker.chars().all(|c| c.is_ascii_graphic() || c == ' ');
    if !well_formed {
        return Err(StakingError::InvalidMoniker(moniker.to_string()));
    }
    Ok(())
}

pub fn validate_consensus_key(key: &[u8]) -> StakingResult<()> {
    if key.is_empty() {
        return Err(StakingError::InvalidConsensusKey("empty key".into()));
    }
    Ok(())
}
