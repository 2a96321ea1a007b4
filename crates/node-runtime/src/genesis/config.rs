//! # Genesis Configuration
//!
//! Parsing and validation of the genesis validator document.

use std::collections::HashSet;
use std::path::Path;

use qc_18_staking::{GenesisValidator, TOKEN};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount};
use thiserror::Error;

/// Length of an aux address word. The validator address fills its last 20 bytes.
pub const AUX_ADDRESS_LEN: usize = 32;

/// Genesis loading errors.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Failed to read genesis file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Malformed genesis document: {0}")]
    Malformed(String),

    #[error("Genesis lists no validators")]
    Empty,

    #[error("Column {column} has {actual} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Validator #{index}: invalid address: {reason}")]
    InvalidAddress { index: usize, reason: String },

    #[error("Validator #{index}: duplicate address {address}")]
    DuplicateValidator { index: usize, address: Address },

    #[error("Validator #{index}: invalid hex in {column}: {reason}")]
    InvalidHex {
        index: usize,
        column: &'static str,
        reason: String,
    },

    #[error("Validator #{index}: invalid voting power {value:?}")]
    InvalidVotingPower { index: usize, value: String },

    #[error("Validator #{index}: aux address does not embed the validator address")]
    AuxAddressMismatch { index: usize },
}

/// Genesis validator document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisConfig {
    pub validator_addresses: Vec<String>,
    /// Hex encoded
    pub consensus_public_keys: Vec<String>,
    /// Whole tokens, as decimal strings
    pub voting_powers: Vec<String>,
    #[serde(default)]
    pub validator_network_addresses: Vec<String>,
    #[serde(default)]
    pub fullnode_network_addresses: Vec<String>,
    /// Hex encoded 32-byte words
    #[serde(default, alias = "aptosAddresses")]
    pub aux_addresses: Vec<String>,
}

impl GenesisConfig {
    pub fn from_json_str(json: &str) -> Result<Self, GenesisError> {
        serde_json::from_str(json).map_err(|e| GenesisError::Malformed(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, GenesisError> {
        let json = std::fs::read_to_string(path).map_err(|e| GenesisError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    /// Local development set: `count` validators with `tokens` each.
    pub fn devnet(count: usize, tokens: u64) -> Self {
        let mut config = Self::default();
        for i in 0..count {
            let byte = (i + 1) as u8;
            let address = Address::repeat_byte(byte);
            config.validator_addresses.push(address.to_string());
            config
                .consensus_public_keys
                .push(format!("0x{}", hex::encode([byte; 48])));
            config.voting_powers.push(tokens.to_string());
            config
                .validator_network_addresses
                .push(format!("/ip4/127.0.0.1/tcp/{}", 6180 + i));
            config.fullnode_network_addresses.push(String::new());
            let mut aux = [0u8; AUX_ADDRESS_LEN];
            aux[AUX_ADDRESS_LEN - 20..].copy_from_slice(address.as_bytes());
            config.aux_addresses.push(hex::encode(aux));
        }
        config
    }

    /// Validate every column and build the staking-layer validator list.
    pub fn parse(&self) -> Result<Vec<GenesisValidator>, GenesisError> {
        let count = self.validator_addresses.len();
        if count == 0 {
            return Err(GenesisError::Empty);
        }
        check_column("consensusPublicKeys", &self.consensus_public_keys, count, false)?;
        check_column("votingPowers", &self.voting_powers, count, false)?;
        check_column(
            "validatorNetworkAddresses",
            &self.validator_network_addresses,
            count,
            true,
        )?;
        check_column(
            "fullnodeNetworkAddresses",
            &self.fullnode_network_addresses,
            count,
            true,
        )?;
        check_column("auxAddresses", &self.aux_addresses, count, true)?;

        let mut seen = HashSet::with_capacity(count);
        let mut validators = Vec::with_capacity(count);
        for (index, raw) in self.validator_addresses.iter().enumerate() {
            let validator: Address = raw.parse().map_err(|e: shared_types::ParseAddressError| {
                GenesisError::InvalidAddress {
                    index,
                    reason: e.0,
                }
            })?;
            if !seen.insert(validator) {
                return Err(GenesisError::DuplicateValidator {
                    index,
                    address: validator,
                });
            }

            let aux_address = match self.aux_addresses.get(index) {
                Some(aux) => parse_aux(index, aux, &validator)?,
                None => Vec::new(),
            };

            validators.push(GenesisValidator {
                validator,
                consensus_public_key: decode_hex(
                    index,
                    "consensusPublicKeys",
                    &self.consensus_public_keys[index],
                )?,
                stake: parse_tokens(index, &self.voting_powers[index])?,
                validator_network_addresses: network_bytes(&self.validator_network_addresses, index),
                fullnode_network_addresses: network_bytes(&self.fullnode_network_addresses, index),
                aux_address,
            });
        }
        Ok(validators)
    }
}

/// Required columns must have one entry per validator; optional ones may
/// also be empty.
fn check_column(
    column: &'static str,
    values: &[String],
    expected: usize,
    optional: bool,
) -> Result<(), GenesisError> {
    if values.len() == expected || (optional && values.is_empty()) {
        return Ok(());
    }
    Err(GenesisError::LengthMismatch {
        column,
        expected,
        actual: values.len(),
    })
}

fn decode_hex(index: usize, column: &'static str, value: &str) -> Result<Vec<u8>, GenesisError> {
    let stripped = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(stripped).map_err(|e| GenesisError::InvalidHex {
        index,
        column,
        reason: e.to_string(),
    })
}

fn parse_tokens(index: usize, value: &str) -> Result<Amount, GenesisError> {
    value
        .trim()
        .parse::<Amount>()
        .ok()
        .and_then(|tokens| tokens.checked_mul(TOKEN))
        .ok_or_else(|| GenesisError::InvalidVotingPower {
            index,
            value: value.to_string(),
        })
}

fn parse_aux(index: usize, value: &str, validator: &Address) -> Result<Vec<u8>, GenesisError> {
    let bytes = decode_hex(index, "auxAddresses", value)?;
    if bytes.len() != AUX_ADDRESS_LEN || bytes[AUX_ADDRESS_LEN - 20..] != validator.as_bytes()[..]
    {
        return Err(GenesisError::AuxAddressMismatch { index });
    }
    Ok(bytes)
}

fn network_bytes(column: &[String], index: usize) -> Vec<u8> {
    column
        .get(index)
        .map(|address| address.as_bytes().to_vec())
        .unwrap_or_default()
}
