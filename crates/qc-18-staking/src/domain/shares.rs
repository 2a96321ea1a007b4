//! Pool share ledger.
//!
//! Shares are not transferable: they are minted on deposit and burned on
//! withdrawal, nothing else.

use super::{math, StakingError, StakingResult};
use serde::{Deserialize, Serialize};
use shared_types::{Address, Amount};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLedger {
    balances: BTreeMap<Address, Amount>,
    total_supply: Amount,
}

impl ShareLedger {
    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    pub fn mint(&mut self, holder: Address, shares: Amount) -> StakingResult<()> {
        let supply = math::checked_add(self.total_supply, shares, "share mint")?;
        let balance = self.balances.entry(holder).or_insert(0);
        *balance += shares;
        self.total_supply = supply;
        Ok(())
    }

    pub fn burn(&mut self, holder: &Address, shares: Amount) -> StakingResult<()> {
        let available = self.balance_of(holder);
        if shares > available {
            return Err(StakingError::InsufficientShares {
                requested: shares,
                available,
            });
        }
        let remaining = available - shares;
        if remaining == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(*holder, remaining);
        }
        self.total_supply -= shares;
        Ok(())
    }
}
