//! # Quantum-Chain Staking Test Suite
//!
//! Unified test crate for the staking subsystem.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Wired staking stack with in-memory collaborators
//! ├── benchmarks/       # Criterion benchmarks per subsystem
//! │   └── qc_18_staking.rs
//! ├── exploits/         # Attack simulations
//! │   ├── share_inflation.rs  # Rounding and share-price manipulation
//! │   ├── reentrancy.rs       # Callbacks re-entering the router
//! │   └── validator_set.rs    # Set takeover and commission abuse
//! └── integration/      # Multi-epoch flows across manager and router
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # By category
//! cargo test -p qc-tests integration::
//! cargo test -p qc-tests exploits::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

pub mod benchmarks;
pub mod fixtures;
