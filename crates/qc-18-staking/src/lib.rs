//! # qc-18-staking
//!
//! Validator staking subsystem for Quantum-Chain.
//!
//! ## Architecture
//!
//! Three components share one transactional state:
//!
//! ```text
//!  user ──→ StakeRouter ──→ StakePool (value)            epoch clock
//!               │                                            │
//!               └──────→ ValidatorManager (admission) ←─ on_new_epoch()
//!                              │
//!        ┌─────────────────────┼──────────────────────┐
//!        ↓                     ↓                      ↓
//!  PerformanceTracker     RewardSink            VoteMirror / ValueTransfer
//! ```
//!
//! - **StakePool**: four lifecycle buckets and a mint/burn share ledger per
//!   validator. Value is conserved: buckets always equal inflow minus outflow.
//! - **ValidatorManager**: registration, the four-state lifecycle, and the
//!   once-per-epoch pass (tick, promote, demote, reward, recompute).
//! - **StakeRouter**: delegate, undelegate, redelegate and claim, behind a
//!   pause switch and a reentrancy guard.
//!
//! Every public operation runs on a draft copy of the state and commits
//! only on success.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qc_18_staking::adapters::*;
//! use qc_18_staking::{ManagerDependencies, RouterDependencies, StakeRouter, ValidatorManager};
//! use std::sync::Arc;
//!
//! let manager = Arc::new(ValidatorManager::new(ManagerDependencies {
//!     config: Arc::new(StaticStakeConfig::default()),
//!     performance: Arc::new(InMemoryPerformanceTracker::new()),
//!     reward_sink: Arc::new(InMemoryRewardSink::new()),
//! }));
//! let router = StakeRouter::new(RouterDependencies {
//!     manager: manager.clone(),
//!     vote_mirror: Arc::new(InMemoryVoteMirror::new()),
//!     transfer: Arc::new(InMemoryLedger::new()),
//!     pause_authority: admin,
//! });
//!
//! let pool = manager.register_validator(validator, params, stake)?;
//! manager.join_validator_set(validator, validator)?;
//! router.delegate(alice, validator, amount)?;
//! manager.on_new_epoch()?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use config::{StakeConfig, TOKEN};
pub use domain::{
    BucketRole, Commission, EpochInfo, ErrorKind, GenesisMismatch, GenesisValidator, PoolId,
    ProposalCounts, RegistrationParams, RewardRecord, StakePool, StakingError, StakingResult,
    ValidatorRecord, ValidatorSetData, ValidatorSetView, ValidatorStatus,
};
pub use events::StakingEvent;
pub use ports::{
    EpochHandler, PerformanceTracker, RewardSink, StakeConfigProvider, StakeRouterApi,
    TimeSource, ValueTransfer, VoteMirror,
};
pub use service::{
    EpochReport, ManagerDependencies, RedelegateOutcome, RouterDependencies, StakeRouter,
    ValidatorManager,
};

/// Subsystem identifier used in logs and telemetry.
pub const SUBSYSTEM_ID: &str = "18";
pub const SUBSYSTEM_NAME: &str = "staking";
