//! Call guards shared by the staking services.

use crate::domain::{StakingError, StakingResult};
use parking_lot::{Condvar, Mutex};
use std::thread::{self, ThreadId};
use tracing::warn;

/// Single-entry section around operations that move value out.
///
/// The section belongs to the thread that entered it. Calls back into the
/// services from that thread fail with [`StakingError::ReentrantCall`];
/// other threads are not reentrant and wait for the section to be released.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    owner: Mutex<Option<ThreadId>>,
    released: Condvar,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the guarded section, waiting while another thread holds it.
    /// The returned token releases it on drop.
    pub fn enter(&self) -> StakingResult<GuardToken<'_>> {
        let current = thread::current().id();
        let mut owner = self.owner.lock();
        while let Some(holder) = *owner {
            if holder == current {
                return Err(StakingError::ReentrantCall);
            }
            self.released.wait(&mut owner);
        }
        *owner = Some(current);
        Ok(GuardToken { guard: self })
    }

    /// Fail if the calling thread is inside a guarded call.
    pub fn ensure_idle(&self) -> StakingResult<()> {
        if *self.owner.lock() == Some(thread::current().id()) {
            return Err(StakingError::ReentrantCall);
        }
        Ok(())
    }

    pub fn is_entered(&self) -> bool {
        self.owner.lock().is_some()
    }
}

#[must_use]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        *self.guard.owner.lock() = None;
        self.guard.released.notify_all();
    }
}

/// Run a collaborator notification whose failure must not abort the
/// caller. Returns whether it succeeded.
pub fn best_effort<F>(hook: &'static str, f: F) -> bool
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(()) => true,
        Err(reason) => {
            warn!(hook, %reason, "Best-effort notification failed");
            crate::metrics::record_notification_failed(hook);
            false
        }
    }
}
