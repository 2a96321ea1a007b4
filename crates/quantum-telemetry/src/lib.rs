//! # Quantum Telemetry
//!
//! Structured logging for Quantum-Chain subsystems.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quantum_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::for_subsystem("18", "staking");
//!     let _logger = init_logging(&config).expect("Failed to init logging");
//!
//!     // Application code here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | unset | Filter directive, wins over `QC_LOG_LEVEL` |
//! | `QC_LOG_LEVEL` | `info` | Log level filter |
//! | `QC_LOG_FORMAT` | `plain` | `json` for one JSON object per line |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging, StructuredLogger};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Global subscriber already initialized: {0}")]
    AlreadyInitialized(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience macro for creating a span with subsystem context.
///
/// # Example
///
/// ```rust,ignore
/// use quantum_telemetry::subsystem_span;
///
/// fn on_new_epoch() {
///     let _span = subsystem_span!("on_new_epoch", subsystem = "staking", epoch = 12);
///     // ... epoch logic
/// }
/// ```
#[macro_export]
macro_rules! subsystem_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}
