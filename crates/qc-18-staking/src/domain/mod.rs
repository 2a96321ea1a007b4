//! Domain layer for the staking subsystem
//!
//! - pool: share-based stake accounting per validator
//! - validator: validator records, lifecycle status, commission
//! - validator_set: set aggregates and the joining-power limit
//! - rewards: performance-weighted reward split
//! - genesis: the validator set seeded before epoch 0

mod buckets;
mod error;
mod genesis;
pub mod math;
mod pool;
mod rewards;
mod shares;
mod validator;
mod validator_set;

pub use buckets::*;
pub use error::*;
pub use genesis::*;
pub use pool::*;
pub use rewards::*;
pub use shares::*;
pub use validator::*;
pub use validator_set::*;
