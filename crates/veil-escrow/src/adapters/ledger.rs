//! In-Memory Asset Ledger
//!
//! Implements the `AssetLedger` port with plain balance/allowance maps.
//! Authorization lives with the callers (escrow/adapter preconditions);
//! this ledger only enforces arithmetic soundness.

use crate::domain::{Address, Asset, EscrowError};
use crate::ports::AssetLedger;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory balance and allowance store.
#[derive(Default)]
pub struct InMemoryLedger {
    balances: RwLock<HashMap<(Address, Asset), u128>>,
    allowances: RwLock<HashMap<(Address, Address, Asset), u128>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit an account out of thin air. Test/genesis helper.
    pub fn mint(&self, account: &Address, asset: &Asset, amount: u128) {
        let mut balances = self.balances.write();
        *balances.entry((*account, *asset)).or_insert(0) += amount;
    }
}

impl AssetLedger for InMemoryLedger {
    fn balance(&self, account: &Address, asset: &Asset) -> u128 {
        *self.balances.read().get(&(*account, *asset)).unwrap_or(&0)
    }

    fn transfer(
        &self,
        from: &Address,
        to: &Address,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), EscrowError> {
        let mut balances = self.balances.write();
        let available = *balances.get(&(*from, *asset)).unwrap_or(&0);
        if available < amount {
            return Err(EscrowError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        balances.insert((*from, *asset), available - amount);
        *balances.entry((*to, *asset)).or_insert(0) += amount;
        Ok(())
    }

    fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), EscrowError> {
        self.allowances
            .write()
            .insert((*owner, *spender, *asset), amount);
        Ok(())
    }

    fn allowance(&self, owner: &Address, spender: &Address, asset: &Asset) -> u128 {
        *self
            .allowances
            .read()
            .get(&(*owner, *spender, *asset))
            .unwrap_or(&0)
    }

    fn transfer_from(
        &self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), EscrowError> {
        {
            let mut allowances = self.allowances.write();
            let granted = *allowances.get(&(*owner, *spender, *asset)).unwrap_or(&0);
            if granted < amount {
                return Err(EscrowError::InsufficientAllowance {
                    needed: amount,
                    available: granted,
                });
            }
            allowances.insert((*owner, *spender, *asset), granted - amount);
        }
        self.transfer(owner, to, asset, amount)
    }
}
