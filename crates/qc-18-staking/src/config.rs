//! Economic parameters of the staking subsystem

use crate::domain::{StakingError, StakingResult};
use serde::{Deserialize, Serialize};
use shared_types::{Amount, BasisPoints, BPS_DENOMINATOR};
use std::str::FromStr;
use tracing::warn;

/// One whole token in the smallest denomination.
pub const TOKEN: Amount = 1_000_000_000_000_000_000;

/// Upper bound for `voting_power_increase_limit`, in percent.
pub const MAX_VOTING_POWER_INCREASE_LIMIT: u64 = 50;

/// Staking parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StakeConfig {
    /// Minimum stake for a validator to join or stay in the set
    pub min_validator_stake: Amount,

    /// Stake ceiling for joining; voting power is capped here
    pub maximum_stake: Amount,

    /// Smallest amount a single delegate or redelegate may move
    pub min_delegation_change: Amount,

    /// Ceiling on active plus pending-active validators
    pub max_validator_count: u64,

    /// Percent of total voting power that may join in one epoch
    pub voting_power_increase_limit: u64,

    /// Global cap on any validator's `max_rate` (bps)
    pub max_commission_rate: BasisPoints,

    /// Fee charged on redelegation (bps)
    pub redelegate_fee_rate: BasisPoints,

    /// Permanently locked part of every registration
    pub lock_amount: Amount,

    /// Minimum seconds between commission rate changes
    pub commission_update_cooldown_secs: u64,

    /// When false, validators cannot join or leave
    pub allow_validator_set_change: bool,
}

impl Default for StakeConfig {
    fn default() -> Self {
        Self {
            min_validator_stake: 1_000 * TOKEN,
            maximum_stake: 1_000_000 * TOKEN,
            min_delegation_change: TOKEN,
            max_validator_count: 100,
            voting_power_increase_limit: 20,
            max_commission_rate: 5_000,
            redelegate_fee_rate: 2,
            lock_amount: TOKEN,
            commission_update_cooldown_secs: 86_400,
            allow_validator_set_change: true,
        }
    }
}

impl StakeConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> StakingResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StakingError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `QC_STAKE_*` environment overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// logged and ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        override_field(&lookup, "QC_STAKE_MIN_VALIDATOR_STAKE", &mut self.min_validator_stake);
        override_field(&lookup, "QC_STAKE_MAXIMUM_STAKE", &mut self.maximum_stake);
        override_field(&lookup, "QC_STAKE_MIN_DELEGATION_CHANGE", &mut self.min_delegation_change);
        override_field(&lookup, "QC_STAKE_MAX_VALIDATOR_COUNT", &mut self.max_validator_count);
        override_field(
            &lookup,
            "QC_STAKE_VOTING_POWER_INCREASE_LIMIT",
            &mut self.voting_power_increase_limit,
        );
        override_field(&lookup, "QC_STAKE_MAX_COMMISSION_RATE", &mut self.max_commission_rate);
        override_field(&lookup, "QC_STAKE_REDELEGATE_FEE_RATE", &mut self.redelegate_fee_rate);
        override_field(&lookup, "QC_STAKE_LOCK_AMOUNT", &mut self.lock_amount);
        override_field(
            &lookup,
            "QC_STAKE_COMMISSION_UPDATE_COOLDOWN_SECS",
            &mut self.commission_update_cooldown_secs,
        );
        override_field(
            &lookup,
            "QC_STAKE_ALLOW_VALIDATOR_SET_CHANGE",
            &mut self.allow_validator_set_change,
        );
        self
    }

    /// Reject inconsistent parameter sets.
    pub fn validate(&self) -> StakingResult<()> {
        let invalid = |msg: String| Err(StakingError::InvalidConfig(msg));

        if self.maximum_stake == 0 {
            return invalid("maximum_stake must be positive".into());
        }
        if self.min_validator_stake > self.maximum_stake {
            return invalid(format!(
                "min_validator_stake {} exceeds maximum_stake {}",
                self.min_validator_stake, self.maximum_stake
            ));
        }
        if self.min_delegation_change == 0 {
            return invalid("min_delegation_change must be positive".into());
        }
        if self.max_validator_count == 0 {
            return invalid("max_validator_count must be positive".into());
        }
        if self.voting_power_increase_limit == 0
            || self.voting_power_increase_limit > MAX_VOTING_POWER_INCREASE_LIMIT
        {
            return invalid(format!(
                "voting_power_increase_limit {} outside 1..={}",
                self.voting_power_increase_limit, MAX_VOTING_POWER_INCREASE_LIMIT
            ));
        }
        if self.max_commission_rate > BPS_DENOMINATOR {
            return invalid(format!(
                "max_commission_rate {} exceeds {}",
                self.max_commission_rate, BPS_DENOMINATOR
            ));
        }
        if self.redelegate_fee_rate > BPS_DENOMINATOR {
            return invalid(format!(
                "redelegate_fee_rate {} exceeds {}",
                self.redelegate_fee_rate, BPS_DENOMINATOR
            ));
        }
        if self.lock_amount == 0 {
            return invalid("lock_amount must be positive".into());
        }
        Ok(())
    }

    /// Value a registration must carry.
    pub fn registration_minimum(&self) -> Amount {
        self.lock_amount.saturating_add(self.min_validator_stake)
    }
}

fn override_field<T, F>(lookup: &F, key: &str, field: &mut T)
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *field = value,
            Err(_) => warn!(key, value = %raw, "Ignoring unparseable staking override"),
        }
    }
}
