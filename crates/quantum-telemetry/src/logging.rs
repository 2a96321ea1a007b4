//! Structured logging.
//!
//! Logs carry consistent fields so they can be filtered per subsystem:
//! - `level`: Log level (trace, debug, info, warn, error)
//! - `subsystem`: Subsystem identifier (staking, consensus, etc.)
//! - `message`: Log message
//! - Additional context fields (`validator`, `epoch`, `amount`, ...)

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Handle returned once the global subscriber is installed.
#[derive(Debug)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

/// Build the `EnvFilter` for a configuration.
///
/// `RUST_LOG` wins over the configured level when both are present.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))
}

/// Install the global `tracing` subscriber.
///
/// Fails with [`TelemetryError::AlreadyInitialized`] if another subscriber
/// is already installed (e.g. when several tests race to initialize).
pub fn init_logging(config: &TelemetryConfig) -> Result<StructuredLogger, TelemetryError> {
    let env_filter = build_filter(config)?;

    if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    } else if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    }

    tracing::debug!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Structured logging initialized"
    );

    Ok(StructuredLogger {
        service_name: config.service_name.clone(),
    })
}

/// Helper to create structured log entries with consistent formatting.
#[macro_export]
macro_rules! log_event {
    // Info level with subsystem
    (info, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Warn level with subsystem
    (warn, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Error level with subsystem
    (error, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };

    // Debug level with subsystem
    (debug, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a validator-related event with standard fields.
#[macro_export]
macro_rules! log_validator_event {
    ($level:ident, $subsystem:expr, $msg:expr, $validator:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            validator = %$validator,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log an epoch-transition event with standard fields.
#[macro_export]
macro_rules! log_epoch_event {
    ($level:ident, $subsystem:expr, $msg:expr, $epoch:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            epoch = $epoch,
            $($($field)*,)?
            $msg
        )
    };
}
