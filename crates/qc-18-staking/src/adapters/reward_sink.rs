use crate::ports::RewardSink;
use parking_lot::RwLock;
use shared_types::{Amount, Epoch};
use std::sync::atomic::{AtomicBool, Ordering};

/// Collects forwarded rewards.
#[derive(Debug, Default)]
pub struct InMemoryRewardSink {
    received: RwLock<Vec<(Epoch, Amount)>>,
    reject: AtomicBool,
}

impl InMemoryRewardSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<(Epoch, Amount)> {
        self.received.read().clone()
    }

    pub fn total(&self) -> Amount {
        self.received.read().iter().map(|(_, a)| *a).sum()
    }

    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }
}

impl RewardSink for InMemoryRewardSink {
    fn absorb(&self, amount: Amount, epoch: Epoch) -> Result<(), String> {
        if self.reject.load(Ordering::SeqCst) {
            return Err("reward sink closed".into());
        }
        self.received.write().push((epoch, amount));
        Ok(())
    }
}
