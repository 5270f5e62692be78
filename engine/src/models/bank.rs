//! Native currency transport
//!
//! Holds the native-currency account of every address in the market,
//! including each token's reserve (the account keyed by the token's own
//! address). Settlement and trading move currency only through
//! [`CurrencyTransport::send`].
//!
//! # Critical Invariants
//!
//! 1. **Atomicity**: a failed send changes nothing
//! 2. **Conservation**: sends never create or destroy currency; only
//!    [`NativeBank::mint`] (genesis funding) increases the total

use crate::models::address::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors raised when currency cannot be moved
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: Address,
        required: u128,
        available: u128,
    },

    #[error("Recipient {recipient} rejected {amount}")]
    RecipientRejected { recipient: Address, amount: u128 },

    #[error("Balance overflow crediting {amount} to {account}")]
    Overflow { account: Address, amount: u128 },
}

/// Primitive for sending native currency between addresses
pub trait CurrencyTransport {
    /// Currency currently held by `account`
    fn balance_of(&self, account: &Address) -> u128;

    /// Move `amount` from `from` to `to`; all-or-nothing
    fn send(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TransportError>;
}

/// In-memory currency accounts
///
/// # Example
/// ```
/// use team_token_engine::{Address, CurrencyTransport, NativeBank};
///
/// let alice = Address::new("ALICE");
/// let team = Address::new("TEAM_BRA");
///
/// let mut bank = NativeBank::new();
/// bank.mint(&alice, 1_000).unwrap();
/// bank.send(&alice, &team, 400).unwrap();
///
/// assert_eq!(bank.balance_of(&alice), 600);
/// assert_eq!(bank.balance_of(&team), 400);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeBank {
    accounts: BTreeMap<Address, u128>,

    /// Addresses that refuse inbound currency (e.g. a recipient that cannot
    /// accept payments)
    rejecting: BTreeSet<Address>,
}

impl NativeBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create currency out of nothing in `account` (genesis funding only)
    pub fn mint(&mut self, account: &Address, amount: u128) -> Result<(), TransportError> {
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or_else(|| TransportError::Overflow {
                account: account.clone(),
                amount,
            })?;
        self.accounts.insert(account.clone(), balance);
        Ok(())
    }

    /// Make `account` refuse (or accept again) inbound currency
    pub fn set_rejecting(&mut self, account: &Address, rejecting: bool) {
        if rejecting {
            self.rejecting.insert(account.clone());
        } else {
            self.rejecting.remove(account);
        }
    }

    pub fn is_rejecting(&self, account: &Address) -> bool {
        self.rejecting.contains(account)
    }

    /// Sum of every account balance
    pub fn total_currency(&self) -> u128 {
        self.accounts.values().sum()
    }

    /// All accounts with their balances, ordered by address
    pub fn accounts(&self) -> Vec<(Address, u128)> {
        self.accounts
            .iter()
            .map(|(account, amount)| (account.clone(), *amount))
            .collect()
    }

    pub fn rejecting_accounts(&self) -> Vec<Address> {
        self.rejecting.iter().cloned().collect()
    }
}

impl CurrencyTransport for NativeBank {
    fn balance_of(&self, account: &Address) -> u128 {
        self.accounts.get(account).copied().unwrap_or(0)
    }

    fn send(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), TransportError> {
        if self.rejecting.contains(to) {
            return Err(TransportError::RecipientRejected {
                recipient: to.clone(),
                amount,
            });
        }
        if amount == 0 || from == to {
            return Ok(());
        }

        let available = self.balance_of(from);
        if available < amount {
            return Err(TransportError::InsufficientFunds {
                account: from.clone(),
                required: amount,
                available,
            });
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| TransportError::Overflow {
                account: to.clone(),
                amount,
            })?;

        self.accounts.insert(from.clone(), available - amount);
        self.accounts.insert(to.clone(), credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(id: &str) -> Address {
        Address::new(id)
    }

    #[test]
    fn test_send_insufficient_funds_changes_nothing() {
        let mut bank = NativeBank::new();
        bank.mint(&addr("ALICE"), 50).unwrap();

        let result = bank.send(&addr("ALICE"), &addr("BOB"), 51);

        assert_eq!(
            result,
            Err(TransportError::InsufficientFunds {
                account: addr("ALICE"),
                required: 51,
                available: 50,
            })
        );
        assert_eq!(bank.balance_of(&addr("ALICE")), 50);
        assert_eq!(bank.balance_of(&addr("BOB")), 0);
    }

    #[test]
    fn test_rejecting_recipient_refuses_even_zero() {
        let mut bank = NativeBank::new();
        bank.mint(&addr("ALICE"), 50).unwrap();
        bank.set_rejecting(&addr("BOB"), true);

        assert!(matches!(
            bank.send(&addr("ALICE"), &addr("BOB"), 10),
            Err(TransportError::RecipientRejected { .. })
        ));
        assert!(matches!(
            bank.send(&addr("ALICE"), &addr("BOB"), 0),
            Err(TransportError::RecipientRejected { .. })
        ));

        bank.set_rejecting(&addr("BOB"), false);
        bank.send(&addr("ALICE"), &addr("BOB"), 10).unwrap();
        assert_eq!(bank.balance_of(&addr("BOB")), 10);
    }

    #[test]
    fn test_sends_conserve_currency() {
        let mut bank = NativeBank::new();
        bank.mint(&addr("ALICE"), 100).unwrap();
        bank.mint(&addr("BOB"), 20).unwrap();

        bank.send(&addr("ALICE"), &addr("BOB"), 35).unwrap();
        bank.send(&addr("BOB"), &addr("CAROL"), 55).unwrap();

        assert_eq!(bank.total_currency(), 120);
        assert_eq!(bank.balance_of(&addr("CAROL")), 55);
    }
}
