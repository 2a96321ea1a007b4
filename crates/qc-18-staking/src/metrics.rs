//! # Staking Metrics
//!
//! Prometheus metrics for the staking subsystem.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-staking = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `staking_epochs_processed_total` - Counter of completed epoch passes
//! - `staking_rewards_distributed_total` - Reward value credited to pools
//! - `staking_rewards_forwarded_total` - Reward value sent to the fallback sink
//! - `staking_status_transitions_total` - Validator status changes (by target status)
//! - `staking_operations_rejected_total` - Rejected operations (by operation and kind)
//! - `staking_notifications_failed_total` - Failed best-effort notifications (by hook)
//! - `staking_total_voting_power` - Voting power after the last epoch pass

use crate::domain::ValidatorStatus;
use shared_types::Amount;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_int_counter, Counter,
    CounterVec, Gauge, IntCounter,
};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref EPOCHS_PROCESSED: IntCounter = register_int_counter!(
        "staking_epochs_processed_total",
        "Total number of completed epoch passes"
    )
    .expect("Failed to create EPOCHS_PROCESSED metric");

    pub static ref REWARDS_DISTRIBUTED: Counter = register_counter!(
        "staking_rewards_distributed_total",
        "Reward value credited to stake pools"
    )
    .expect("Failed to create REWARDS_DISTRIBUTED metric");

    pub static ref REWARDS_FORWARDED: Counter = register_counter!(
        "staking_rewards_forwarded_total",
        "Reward value forwarded to the fallback sink"
    )
    .expect("Failed to create REWARDS_FORWARDED metric");

    pub static ref STATUS_TRANSITIONS: CounterVec = register_counter_vec!(
        "staking_status_transitions_total",
        "Validator status transitions",
        &["to"]
    )
    .expect("Failed to create STATUS_TRANSITIONS metric");

    pub static ref OPERATIONS_REJECTED: CounterVec = register_counter_vec!(
        "staking_operations_rejected_total",
        "Staking operations rejected",
        &["operation", "kind"]
    )
    .expect("Failed to create OPERATIONS_REJECTED metric");

    pub static ref NOTIFICATIONS_FAILED: CounterVec = register_counter_vec!(
        "staking_notifications_failed_total",
        "Best-effort collaborator notifications that failed",
        &["hook"]
    )
    .expect("Failed to create NOTIFICATIONS_FAILED metric");

    pub static ref TOTAL_VOTING_POWER: Gauge = register_gauge!(
        "staking_total_voting_power",
        "Total voting power after the last epoch pass"
    )
    .expect("Failed to create TOTAL_VOTING_POWER metric");
}

fn status_label(status: ValidatorStatus) -> &'static str {
    match status {
        ValidatorStatus::Inactive => "inactive",
        ValidatorStatus::PendingActive => "pending_active",
        ValidatorStatus::Active => "active",
        ValidatorStatus::PendingInactive => "pending_inactive",
    }
}

/// Record a completed epoch pass
#[cfg(feature = "metrics")]
pub fn record_epoch_processed(total_voting_power: Amount, distributed: Amount, forwarded: Amount) {
    EPOCHS_PROCESSED.inc();
    TOTAL_VOTING_POWER.set(total_voting_power as f64);
    REWARDS_DISTRIBUTED.inc_by(distributed as f64);
    REWARDS_FORWARDED.inc_by(forwarded as f64);
}

#[cfg(feature = "metrics")]
pub fn record_status_transition(to: ValidatorStatus) {
    STATUS_TRANSITIONS
        .with_label_values(&[status_label(to)])
        .inc();
}

#[cfg(feature = "metrics")]
pub fn record_operation_rejected(operation: &str, kind: &str) {
    OPERATIONS_REJECTED
        .with_label_values(&[operation, kind])
        .inc();
}

#[cfg(feature = "metrics")]
pub fn record_notification_failed(hook: &str) {
    NOTIFICATIONS_FAILED.with_label_values(&[hook]).inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_epoch_processed(_total_voting_power: Amount, _distributed: Amount, _forwarded: Amount) {}

#[cfg(not(feature = "metrics"))]
pub fn record_status_transition(to: ValidatorStatus) {
    let _ = status_label(to);
}

#[cfg(not(feature = "metrics"))]
pub fn record_operation_rejected(_operation: &str, _kind: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_notification_failed(_hook: &str) {}
