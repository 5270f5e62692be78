//! Trading operations: buy, sell and plain transfer
//!
//! Buy converts attached currency into newly minted tokens at the current
//! unit price; sell burns tokens and pays `amount * unit_price` out of the
//! token's reserve. Neither moves the price and neither charges a fee.
//!
//! # Critical Invariants
//!
//! - **Truncation**: buy mints `floor(value / price)`; the remainder stays in
//!   the reserve
//! - **Atomicity**: every check runs before the first mutation, so a failed
//!   trade changes nothing
//! - **Supply Conservation**: `total_supply == sum(balances)` after each trade

use crate::lifecycle::LifecycleError;
use crate::models::address::Address;
use crate::models::bank::{CurrencyTransport, TransportError};
use crate::models::ledger::{BalanceLedger, LedgerError};
use crate::models::token::Token;
use thiserror::Error;

/// Errors that can occur during trading
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TradeError {
    #[error("Unit price is zero; buying is disabled")]
    ZeroPrice,

    #[error("Payout overflow selling {amount} at {price}")]
    PayoutOverflow { amount: u128, price: u128 },

    #[error("Transfers to the token itself are sells; use sell")]
    TransferToToken,

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result of a buy or sell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    /// Tokens minted (buy) or burned (sell)
    pub token_amount: u128,

    /// Currency received (buy) or paid out (sell)
    pub currency_amount: u128,
}

/// Buy tokens with `value` units of currency sent by `buyer`
///
/// When the token has no supply, the price is reset to the initial price
/// before minting.
///
/// # Example
///
/// ```rust
/// use team_token_engine::{Address, CurrencyTransport, GameRules, NativeBank, Token, TokenConfig};
/// use team_token_engine::trading::buy;
///
/// let alice = Address::new("ALICE");
/// let mut bank = NativeBank::new();
/// bank.mint(&alice, 10_500).unwrap();
///
/// let mut token: Token = Token::new(
///     TokenConfig {
///         address: Address::new("TEAM_BRA"),
///         name: "Brazil".to_string(),
///         symbol: "BRA".to_string(),
///         decimals: 0,
///         administrator: Address::new("ADMIN"),
///         fee_recipient: Address::new("TREASURY"),
///         initial_price: 1_000,
///     },
///     GameRules::default(),
/// );
///
/// let trade = buy(&mut token, &mut bank, &alice, 10_500, 1_520_000_000).unwrap();
/// assert_eq!(trade.token_amount, 10);
/// assert_eq!(bank.balance_of(token.address()), 10_500);
/// ```
pub fn buy<L: BalanceLedger, T: CurrencyTransport>(
    token: &mut Token<L>,
    transport: &mut T,
    buyer: &Address,
    value: u128,
    now: u64,
) -> Result<Trade, TradeError> {
    token.lifecycle().ensure_trading_open(now, token.rules())?;

    let price = if token.total_supply() == 0 {
        token.initial_price()
    } else {
        token.unit_price()
    };
    if price == 0 {
        return Err(TradeError::ZeroPrice);
    }
    let minted = value / price;
    if token.total_supply().checked_add(minted).is_none() {
        return Err(TradeError::Ledger(LedgerError::SupplyOverflow {
            holder: buyer.clone(),
            amount: minted,
        }));
    }

    transport.send(buyer, token.address(), value)?;
    token.set_unit_price(price);
    token.ledger_mut().credit(buyer, minted)?;

    Ok(Trade {
        token_amount: minted,
        currency_amount: value,
    })
}

/// Sell `amount` tokens held by `seller` back to the token for currency
pub fn sell<L: BalanceLedger, T: CurrencyTransport>(
    token: &mut Token<L>,
    transport: &mut T,
    seller: &Address,
    amount: u128,
    now: u64,
) -> Result<Trade, TradeError> {
    token.lifecycle().ensure_trading_open(now, token.rules())?;

    let available = token.balance_of(seller);
    if available < amount {
        return Err(TradeError::Ledger(LedgerError::InsufficientBalance {
            holder: seller.clone(),
            required: amount,
            available,
        }));
    }
    let price = token.unit_price();
    let payout = amount
        .checked_mul(price)
        .ok_or(TradeError::PayoutOverflow { amount, price })?;

    transport.send(token.address(), seller, payout)?;
    token.ledger_mut().debit(seller, amount)?;

    Ok(Trade {
        token_amount: amount,
        currency_amount: payout,
    })
}

/// Move `amount` tokens between two holders; no currency moves
pub fn transfer<L: BalanceLedger>(
    token: &mut Token<L>,
    from: &Address,
    to: &Address,
    amount: u128,
) -> Result<(), TradeError> {
    if to == token.address() {
        return Err(TradeError::TransferToToken);
    }
    token.ledger_mut().transfer(from, to, amount)?;
    Ok(())
}
