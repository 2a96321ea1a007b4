use crate::domain::ProposalCounts;
use crate::ports::PerformanceTracker;
use parking_lot::RwLock;
use shared_types::Address;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Proposal-outcome tracker. Counters reset when the epoch pass reports
/// the new active set.
#[derive(Debug, Default)]
pub struct InMemoryPerformanceTracker {
    counts: RwLock<HashMap<Address, ProposalCounts>>,
    active_sets: RwLock<Vec<Vec<Address>>>,
    fail_notifications: AtomicBool,
}

impl InMemoryPerformanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_proposal(&self, proposer: Address, successful: bool) {
        let mut counts = self.counts.write();
        let entry = counts.entry(proposer).or_default();
        if successful {
            entry.successful += 1;
        } else {
            entry.failed += 1;
        }
    }

    pub fn set_counts(&self, validator: Address, successful: u64, failed: u64) {
        self.counts
            .write()
            .insert(validator, ProposalCounts { successful, failed });
    }

    /// Active sets received so far, oldest first.
    pub fn notified_sets(&self) -> Vec<Vec<Address>> {
        self.active_sets.read().clone()
    }

    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }
}

impl PerformanceTracker for InMemoryPerformanceTracker {
    fn proposal_counts(&self, validator: &Address) -> Option<ProposalCounts> {
        self.counts.read().get(validator).copied()
    }

    fn on_new_epoch(&self, active_set: &[Address]) -> Result<(), String> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err("performance tracker unavailable".into());
        }
        self.counts.write().clear();
        self.active_sets.write().push(active_set.to_vec());
        Ok(())
    }
}
