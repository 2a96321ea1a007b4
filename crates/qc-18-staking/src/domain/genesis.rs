//! Genesis validator set.

use super::Commission;
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount};

/// A validator seeded into the set before the first epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisValidator {
    pub validator: Address,
    pub consensus_public_key: Vec<u8>,
    /// Total registration value, lock included
    pub stake: Amount,
    pub validator_network_addresses: Vec<u8>,
    pub fullnode_network_addresses: Vec<u8>,
    pub aux_address: Vec<u8>,
}

impl GenesisValidator {
    pub fn moniker(index: usize) -> String {
        format!("genesis-{index}")
    }

    /// Genesis validators start at zero commission and may later raise it
    /// up to the configured cap in one step.
    pub fn commission(cap: u64) -> Commission {
        Commission {
            rate: 0,
            max_rate: cap,
            max_change_rate: cap,
        }
    }
}

/// A difference between the live active set and the genesis it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum GenesisMismatch {
    #[error("Active set has {actual} validators, genesis lists {expected}")]
    ValidatorCount { expected: usize, actual: usize },

    #[error("Genesis validator {0} is not active")]
    NotActive(Address),

    #[error("Operator of {validator} is {operator}")]
    Operator { validator: Address, operator: Address },

    #[error("Consensus key of {0} differs from genesis")]
    ConsensusKey(Address),

    #[error("Voting power of {validator} is {actual}, expected {expected}")]
    VotingPower {
        validator: Address,
        expected: Amount,
        actual: Amount,
    },

    #[error("Network addresses of {0} differ from genesis")]
    NetworkAddresses(Address),

    #[error("Aux address of {0} differs from genesis")]
    AuxAddress(Address),
}
