//! Events recorded by committed staking transactions.
//!
//! Events are buffered in manager state, so a rejected operation never
//! leaves events behind. Drain them with `ValidatorManager::take_events`.

use crate::domain::{PoolId, ValidatorStatus};
use serde::Serialize;
use shared_types::{Address, Amount, BasisPoints, Epoch};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StakingEvent {
    ValidatorRegistered {
        validator: Address,
        operator: Address,
        pool: PoolId,
        initial_stake: Amount,
    },
    ValidatorStatusChanged {
        validator: Address,
        from: ValidatorStatus,
        to: ValidatorStatus,
        epoch: Epoch,
    },
    CommissionRateUpdated {
        validator: Address,
        old_rate: BasisPoints,
        new_rate: BasisPoints,
    },
    ConsensusKeyUpdated {
        validator: Address,
    },
    NetworkAddressesUpdated {
        validator: Address,
    },
    OperatorUpdated {
        validator: Address,
        old_operator: Address,
        new_operator: Address,
    },
    CommissionBeneficiaryUpdated {
        validator: Address,
        beneficiary: Address,
    },
    Delegated {
        holder: Address,
        validator: Address,
        amount: Amount,
        shares: Amount,
    },
    Undelegated {
        holder: Address,
        validator: Address,
        shares: Amount,
        amount: Amount,
    },
    StakeReactivated {
        holder: Address,
        validator: Address,
        amount: Amount,
    },
    Redelegated {
        holder: Address,
        src: Address,
        dst: Address,
        amount: Amount,
        fee: Amount,
        shares: Amount,
    },
    Claimed {
        holder: Address,
        validator: Address,
        amount: Amount,
    },
    BlockRewardDeposited {
        amount: Amount,
        reward_pool: Amount,
    },
    RewardDistributed {
        validator: Address,
        epoch: Epoch,
        reward: Amount,
        commission: Amount,
    },
    RewardForwardedToSink {
        epoch: Epoch,
        amount: Amount,
    },
    EpochTransitioned {
        epoch: Epoch,
        total_voting_power: Amount,
        active_validators: usize,
    },
}
