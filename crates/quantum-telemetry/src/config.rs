//! Logging configuration for a staking process.

/// Where and how log lines are written.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on every log line
    pub service_name: String,

    /// Level or full `EnvFilter` directive, e.g. `qc_18_staking=debug,info`
    pub log_level: String,

    /// Install a formatting layer at all; `false` only filters
    pub console_output: bool,

    /// One JSON object per line instead of the plain format
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "quantum-chain".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Logging for subsystem `qc-<id>-<name>`, with environment overrides.
    pub fn for_subsystem(subsystem_id: &str, subsystem_name: &str) -> Self {
        Self {
            service_name: format!("qc-{}-{}", subsystem_id, subsystem_name),
            ..Self::default()
        }
        .with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `QC_LOG_LEVEL` and `QC_LOG_FORMAT` (`json` or `plain`).
    /// `RUST_LOG` is read later by the filter and wins over both.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("QC_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = lookup("QC_LOG_FORMAT") {
            self.json_logs = format.eq_ignore_ascii_case("json");
        }
        self
    }
}
