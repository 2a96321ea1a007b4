//! In-memory adapters for the outbound ports.
//!
//! Used by tests, benchmarks and single-process deployments.

mod clock;
mod config_provider;
mod ledger;
mod performance;
mod reward_sink;
mod vote_mirror;

pub use clock::ManualTimeSource;
pub use config_provider::StaticStakeConfig;
pub use ledger::InMemoryLedger;
pub use performance::InMemoryPerformanceTracker;
pub use reward_sink::InMemoryRewardSink;
pub use vote_mirror::InMemoryVoteMirror;
