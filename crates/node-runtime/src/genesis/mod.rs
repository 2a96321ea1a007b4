//! # Genesis Module
//!
//! Loads the genesis validator set and turns it into staking-layer input.
//!
//! The JSON document lists validators column-wise:
//!
//! ```json
//! {
//!   "validatorAddresses": ["0x...", "0x..."],
//!   "consensusPublicKeys": ["0x...", "0x..."],
//!   "votingPowers": ["10000", "25000"],
//!   "validatorNetworkAddresses": ["/ip4/10.0.0.1/tcp/6180", ""],
//!   "fullnodeNetworkAddresses": ["", ""],
//!   "auxAddresses": ["0x000000000000000000000000<validator>", "..."]
//! }
//! ```
//!
//! Voting powers are whole tokens. Network and aux columns may be omitted.

pub mod config;

pub use config::{GenesisConfig, GenesisError};
