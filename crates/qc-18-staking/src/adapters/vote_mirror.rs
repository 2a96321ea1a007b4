use crate::domain::PoolId;
use crate::ports::VoteMirror;
use parking_lot::RwLock;
use shared_types::{Address, Amount};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Governance vote-weight mirror.
#[derive(Debug, Default)]
pub struct InMemoryVoteMirror {
    shares: RwLock<HashMap<(Address, PoolId), Amount>>,
    delegations: RwLock<HashMap<Address, Address>>,
    offline: AtomicBool,
}

impl InMemoryVoteMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shares_of(&self, holder: &Address, pool: &PoolId) -> Amount {
        self.shares
            .read()
            .get(&(*holder, *pool))
            .copied()
            .unwrap_or(0)
    }

    pub fn delegatee_of(&self, holder: &Address) -> Option<Address> {
        self.delegations.read().get(holder).copied()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), String> {
        if self.offline.load(Ordering::SeqCst) {
            return Err("vote mirror offline".into());
        }
        Ok(())
    }
}

impl VoteMirror for InMemoryVoteMirror {
    fn on_shares_changed(
        &self,
        holder: &Address,
        pool: &PoolId,
        shares: Amount,
    ) -> Result<(), String> {
        self.ensure_online()?;
        let mut map = self.shares.write();
        if shares == 0 {
            map.remove(&(*holder, *pool));
        } else {
            map.insert((*holder, *pool), shares);
        }
        Ok(())
    }

    fn delegate_votes(&self, holder: &Address, delegatee: &Address) -> Result<(), String> {
        self.ensure_online()?;
        self.delegations.write().insert(*holder, *delegatee);
        Ok(())
    }
}
