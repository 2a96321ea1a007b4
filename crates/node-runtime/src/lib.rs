//! # Node Runtime Library
//!
//! Exposes the node's modules for testing. The entry point is the
//! `main.rs` binary.
//!
//! - `container/`: staking services, collaborators and node configuration
//! - `genesis/`: the genesis validator document

pub mod container;
pub mod genesis;

pub use container::{ConfigError, EpochConfig, NodeConfig, StakingContainer};
pub use genesis::{GenesisConfig, GenesisError};
