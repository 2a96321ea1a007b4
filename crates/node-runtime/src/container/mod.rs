//! # Staking Container
//!
//! Holds the staking services and their in-process collaborators with
//! shared ownership, and drives one simulated epoch at a time.

pub mod config;
pub mod staking;

pub use config::{ConfigError, EpochConfig, NodeConfig};
pub use staking::{Manager, Router, StakingContainer};
