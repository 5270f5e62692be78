//! Token balance ledger
//!
//! Balance and supply bookkeeping for a single token. The settlement engine
//! only talks to the [`BalanceLedger`] trait; [`Ledger`] is the in-memory
//! implementation used by the market.
//!
//! # Critical Invariants
//!
//! 1. **Supply Conservation**: `total_supply == sum(balances)` after every call
//! 2. **No Negative Balances**: a debit larger than the balance is rejected and
//!    leaves the ledger untouched

use crate::models::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance for {holder}: required {required}, available {available}")]
    InsufficientBalance {
        holder: Address,
        required: u128,
        available: u128,
    },

    #[error("Supply overflow crediting {amount} to {holder}")]
    SupplyOverflow { holder: Address, amount: u128 },
}

/// Balance ledger consumed by the trading and settlement engines
pub trait BalanceLedger {
    /// Balance held by `holder` (zero for unknown holders)
    fn balance_of(&self, holder: &Address) -> u128;

    /// Mint `amount` to `holder`, increasing total supply
    fn credit(&mut self, holder: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Burn `amount` from `holder`, decreasing total supply
    fn debit(&mut self, holder: &Address, amount: u128) -> Result<(), LedgerError>;

    /// Sum of all balances
    fn total_supply(&self) -> u128;

    /// Move `amount` between holders without changing supply
    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError>;
}

/// In-memory balance ledger
///
/// # Example
/// ```
/// use team_token_engine::{Address, BalanceLedger, Ledger};
///
/// let alice = Address::new("ALICE");
/// let mut ledger = Ledger::new();
/// ledger.credit(&alice, 1_000).unwrap();
/// ledger.debit(&alice, 400).unwrap();
///
/// assert_eq!(ledger.balance_of(&alice), 600);
/// assert_eq!(ledger.total_supply(), 600);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    balances: BTreeMap<Address, u128>,
    total_supply: u128,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from holder balances (zero balances are dropped)
    pub fn from_balances(entries: impl IntoIterator<Item = (Address, u128)>) -> Result<Self, LedgerError> {
        let mut ledger = Self::new();
        for (holder, amount) in entries {
            ledger.credit(&holder, amount)?;
        }
        Ok(ledger)
    }

    /// All holders with a nonzero balance, ordered by address
    pub fn balances(&self) -> Vec<(Address, u128)> {
        self.balances
            .iter()
            .map(|(holder, amount)| (holder.clone(), *amount))
            .collect()
    }

    /// Number of holders with a nonzero balance
    pub fn num_holders(&self) -> usize {
        self.balances.len()
    }
}

impl BalanceLedger for Ledger {
    fn balance_of(&self, holder: &Address) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    fn credit(&mut self, holder: &Address, amount: u128) -> Result<(), LedgerError> {
        if amount == 0 {
            return Ok(());
        }
        let overflow = || LedgerError::SupplyOverflow {
            holder: holder.clone(),
            amount,
        };
        let supply = self.total_supply.checked_add(amount).ok_or_else(overflow)?;
        let balance = self.balance_of(holder).checked_add(amount).ok_or_else(overflow)?;

        self.total_supply = supply;
        self.balances.insert(holder.clone(), balance);
        Ok(())
    }

    fn debit(&mut self, holder: &Address, amount: u128) -> Result<(), LedgerError> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                holder: holder.clone(),
                required: amount,
                available,
            });
        }
        if amount == 0 {
            return Ok(());
        }

        let remaining = available - amount;
        if remaining == 0 {
            self.balances.remove(holder);
        } else {
            self.balances.insert(holder.clone(), remaining);
        }
        self.total_supply -= amount;
        Ok(())
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
        // Supply is unchanged, so debit-then-credit cannot overflow it
        self.debit(from, amount)?;
        self.credit(to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: &str) -> Address {
        Address::new(id)
    }

    #[test]
    fn test_debit_more_than_balance_leaves_ledger_untouched() {
        let mut ledger = Ledger::new();
        ledger.credit(&addr("ALICE"), 100).unwrap();

        let result = ledger.debit(&addr("ALICE"), 101);

        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                holder: addr("ALICE"),
                required: 101,
                available: 100,
            })
        );
        assert_eq!(ledger.balance_of(&addr("ALICE")), 100);
        assert_eq!(ledger.total_supply(), 100);
    }

    #[test]
    fn test_transfer_preserves_supply() {
        let mut ledger = Ledger::new();
        ledger.credit(&addr("ALICE"), 100).unwrap();

        ledger.transfer(&addr("ALICE"), &addr("BOB"), 30).unwrap();

        assert_eq!(ledger.balance_of(&addr("ALICE")), 70);
        assert_eq!(ledger.balance_of(&addr("BOB")), 30);
        assert_eq!(ledger.total_supply(), 100);
    }

    #[test]
    fn test_emptied_holder_is_dropped() {
        let mut ledger = Ledger::new();
        ledger.credit(&addr("ALICE"), 5).unwrap();
        ledger.debit(&addr("ALICE"), 5).unwrap();

        assert_eq!(ledger.num_holders(), 0);
        assert!(ledger.balances().is_empty());
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let mut ledger = Ledger::new();
        ledger.credit(&addr("ALICE"), u128::MAX).unwrap();

        let result = ledger.credit(&addr("BOB"), 1);

        assert!(matches!(result, Err(LedgerError::SupplyOverflow { .. })));
        assert_eq!(ledger.balance_of(&addr("BOB")), 0);
    }

    #[test]
    fn test_from_balances_sums_supply() {
        let ledger =
            Ledger::from_balances(vec![(addr("ALICE"), 10), (addr("BOB"), 0), (addr("CAROL"), 7)])
                .unwrap();

        assert_eq!(ledger.total_supply(), 17);
        assert_eq!(ledger.num_holders(), 2);
    }
}
