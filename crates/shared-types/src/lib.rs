//! # Shared Types Crate
//!
//! Primitive entities used across the staking subsystem and the collaborators
//! it talks to (performance tracker, vote mirror, reward sink).
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses, amounts and epochs are defined once.
//! - **Integer Money**: every amount is an unsigned integer in the smallest
//!   denomination; there are no floating point values anywhere in accounting.
//! - **Basis Points**: every rate (commission, fees, limits) is expressed in
//!   basis points where `10_000` is 100%.

pub mod entities;

pub use entities::*;
