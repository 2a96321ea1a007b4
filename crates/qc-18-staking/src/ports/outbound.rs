//! Driven ports (Outbound dependencies)
//!
//! Collaborators report failures as `Result<_, String>`; the services map
//! them into `StakingError` or log them, depending on the call site.

use crate::config::StakeConfig;
use crate::domain::{PoolId, ProposalCounts};
use shared_types::{Address, Amount, Epoch, Timestamp};

/// Read-only source of economic parameters.
pub trait StakeConfigProvider: Send + Sync {
    fn stake_config(&self) -> StakeConfig;
}

/// Per-epoch proposal statistics.
///
/// Implementations are called while the epoch pass holds the manager
/// state and must not call back into the staking services.
pub trait PerformanceTracker: Send + Sync {
    /// Proposal outcomes of `validator` in the ending epoch.
    fn proposal_counts(&self, validator: &Address) -> Option<ProposalCounts>;

    /// Receive the finalized active set for the new epoch.
    fn on_new_epoch(&self, active_set: &[Address]) -> Result<(), String>;
}

/// Governance vote-weight projection of pool shares.
pub trait VoteMirror: Send + Sync {
    /// `holder` now owns `shares` of `pool`.
    fn on_shares_changed(&self, holder: &Address, pool: &PoolId, shares: Amount)
        -> Result<(), String>;

    /// Point `holder`'s governance votes at `delegatee`.
    fn delegate_votes(&self, holder: &Address, delegatee: &Address) -> Result<(), String>;
}

/// Receives reward value that no validator earned.
pub trait RewardSink: Send + Sync {
    fn absorb(&self, amount: Amount, epoch: Epoch) -> Result<(), String>;
}

/// Pays value out of the staking system.
pub trait ValueTransfer: Send + Sync {
    fn transfer(&self, recipient: &Address, amount: Amount) -> Result<(), String>;
}

/// Time source abstraction (for testing)
pub trait TimeSource: Send + Sync {
    /// Get current unix timestamp in seconds
    fn now(&self) -> Timestamp;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
