use crate::ports::ValueTransfer;
use parking_lot::RwLock;
use shared_types::{Address, Amount};
use std::collections::{HashMap, HashSet};

/// Native-balance ledger receiving payouts.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: RwLock<HashMap<Address, Amount>>,
    rejecting: RwLock<HashSet<Address>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.read().get(account).copied().unwrap_or(0)
    }

    pub fn total_paid(&self) -> Amount {
        self.balances.read().values().sum()
    }

    /// Make every transfer to `account` fail.
    pub fn reject(&self, account: Address) {
        self.rejecting.write().insert(account);
    }

    pub fn accept(&self, account: &Address) {
        self.rejecting.write().remove(account);
    }
}

impl ValueTransfer for InMemoryLedger {
    fn transfer(&self, recipient: &Address, amount: Amount) -> Result<(), String> {
        if self.rejecting.read().contains(recipient) {
            return Err(format!("recipient {recipient} rejects transfers"));
        }
        let mut balances = self.balances.write();
        let balance = balances.entry(*recipient).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| "balance overflow".to_string())?;
        Ok(())
    }
}
