//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `Address`
//! - **Value**: `Amount`, `BasisPoints`, `U256`
//! - **Time**: `Epoch`, `Timestamp`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export U256 from primitive-types for wide intermediate arithmetic
pub use primitive_types::U256;

/// A 32-byte hash (Keccak-256).
pub type Hash = [u8; 32];

/// Token amount in the smallest denomination.
pub type Amount = u128;

/// Epoch counter, incremented once per epoch transition.
pub type Epoch = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Rate expressed in basis points (`10_000` = 100%).
pub type BasisPoints = u64;

/// Denominator for all basis-point rates.
pub const BPS_DENOMINATOR: BasisPoints = 10_000;

/// A 20-byte Ethereum-style account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Well-known burn address `0x…dEaD`. Nobody holds its key, so value
    /// credited to it is locked forever.
    pub const DEAD: Address = Address([
        0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xde, 0xad,
    ]);

    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Convenience constructor used heavily in tests: every byte set to `b`.
    pub const fn repeat_byte(b: u8) -> Self {
        Self([b; 20])
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Error returned when parsing an address from a hex string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAddressError(pub String);

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid address: {}", self.0)
    }
}

impl std::error::Error for ParseAddressError {}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| ParseAddressError(e.to_string()))?;
        let array: [u8; 20] = bytes
            .try_into()
            .map_err(|_| ParseAddressError(format!("expected 20 bytes: {s}")))?;
        Ok(Self(array))
    }
}

/// Apply a basis-point rate to an amount, truncating toward zero.
pub fn apply_bps(amount: Amount, rate: BasisPoints) -> Amount {
    let product = U256::from(amount) * U256::from(rate);
    (product / U256::from(BPS_DENOMINATOR)).low_u128()
}
