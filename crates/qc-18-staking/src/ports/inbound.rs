//! Driving ports (Inbound API)

use crate::domain::StakingResult;
use crate::service::{EpochReport, RedelegateOutcome};
use shared_types::{Address, Amount};

/// Entry point of the epoch clock.
pub trait EpochHandler: Send + Sync {
    /// Run the once-per-epoch pass. Called exactly once per boundary.
    fn on_new_epoch(&self) -> StakingResult<EpochReport>;
}

/// User-facing staking API.
pub trait StakeRouterApi: Send + Sync {
    /// Deposit `amount` with `validator`; returns minted shares.
    fn delegate(&self, caller: Address, validator: Address, amount: Amount)
        -> StakingResult<Amount>;

    /// Start unbonding `shares`; returns the value moved to pending-inactive.
    fn undelegate(&self, caller: Address, validator: Address, shares: Amount)
        -> StakingResult<Amount>;

    /// Return up to `amount` of a pending unlock to active stake; returns
    /// the value moved.
    fn reactivate(&self, caller: Address, validator: Address, amount: Amount)
        -> StakingResult<Amount>;

    /// Move `shares` worth of stake from `src` to `dst`.
    fn redelegate(
        &self,
        caller: Address,
        src: Address,
        dst: Address,
        shares: Amount,
        delegate_votes: bool,
    ) -> StakingResult<RedelegateOutcome>;

    /// Withdraw matured stake from one validator.
    fn claim(&self, caller: Address, validator: Address) -> StakingResult<Amount>;

    /// Withdraw matured stake from several validators, skipping those with
    /// nothing to claim. Returns the total paid.
    fn claim_batch(&self, caller: Address, validators: &[Address]) -> StakingResult<Amount>;
}
