//! Fixed-point helpers.
//!
//! All share/value conversions multiply before dividing through a 256-bit
//! intermediate, so `a * b` never overflows and truncation happens once.

use super::{StakingError, StakingResult};
use shared_types::{Amount, U256};

/// `a * b / denominator`, truncated toward zero.
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> StakingResult<Amount> {
    if denominator == 0 {
        return Err(StakingError::DivisionByZero("mul_div"));
    }
    let result = U256::from(a) * U256::from(b) / U256::from(denominator);
    to_amount(result, "mul_div")
}

/// Narrow a 256-bit value back into an [`Amount`].
pub fn to_amount(value: U256, context: &'static str) -> StakingResult<Amount> {
    if value > U256::from(Amount::MAX) {
        return Err(StakingError::ArithmeticOverflow(context));
    }
    Ok(value.low_u128())
}

pub fn checked_add(a: Amount, b: Amount, context: &'static str) -> StakingResult<Amount> {
    a.checked_add(b)
        .ok_or(StakingError::ArithmeticOverflow(context))
}
