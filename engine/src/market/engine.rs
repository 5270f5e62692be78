//! Market Engine
//!
//! Owns every token, the currency transport, the clock and the event log,
//! and runs each operation to completion before the next one starts.
//!
//! # Atomicity
//!
//! Every public operation runs inside `Market::atomically`: token state,
//! currency accounts and the event-log length are captured first and put back
//! if the operation fails. A failed `end_game` therefore leaves both tokens,
//! the fee recipient and the peer's reserve exactly as they were, even when
//! the failure happens after the fee was paid.
//!
//! # Example
//!
//! ```rust
//! use team_token_engine::{Address, Market, MarketConfig, Outcome};
//!
//! let config = MarketConfig::from_json(r#"{
//!     "start_time": 1520000000,
//!     "tokens": [
//!         { "address": "TEAM_A", "name": "A", "symbol": "A",
//!           "administrator": "ADMIN_A", "fee_recipient": "TREASURY", "initial_price": 10 },
//!         { "address": "TEAM_B", "name": "B", "symbol": "B",
//!           "administrator": "ADMIN_B", "fee_recipient": "TREASURY", "initial_price": 10 }
//!     ],
//!     "accounts": [{ "address": "ALICE", "balance": 1000 }, { "address": "BOB", "balance": 1000 }]
//! }"#).unwrap();
//! let mut market = Market::new(config).unwrap();
//!
//! let (a, b) = (Address::new("TEAM_A"), Address::new("TEAM_B"));
//! market.buy(&a, &Address::new("ALICE"), 100).unwrap();
//! market.buy(&b, &Address::new("BOB"), 100).unwrap();
//!
//! market.begin_game(&a, &Address::new("ADMIN_A"), &b, None).unwrap();
//! market.begin_game(&b, &Address::new("ADMIN_B"), &a, None).unwrap();
//!
//! let receipt = market.end_game(&a, &Address::new("ADMIN_A"), &b, Outcome::Lose).unwrap();
//! assert_eq!(receipt.fee, 5);
//! assert_eq!(market.reserve_of(&b), 195);
//! ```

use crate::core::time::Clock;
use crate::lifecycle::{LifecycleError, TradingStatus};
use crate::models::address::Address;
use crate::models::bank::{CurrencyTransport, NativeBank, TransportError};
use crate::models::event::{Event, EventLog};
use crate::models::token::{AuthorizationError, Token};
use crate::settlement::{self, Outcome, SettlementError, SettlementReceipt};
use crate::trading::{self, Trade, TradeError};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::MarketConfig;

// ============================================================================
// Errors
// ============================================================================

/// Failure class of a rejected operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller is not the administrator or not the registered opponent
    Authorization,
    /// Operation not allowed in the current state or with these arguments
    Precondition,
    /// Currency could not be moved
    Transport,
}

/// Errors returned by market operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("Unknown token: {0}")]
    UnknownToken(Address),

    #[error("Reserve sweep is only allowed after {deadline} (now {now})")]
    SweepBeforeDeadline { now: u64, deadline: u64 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("State validation error: {0}")]
    StateValidation(String),

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Trade error: {0}")]
    Trade(#[from] TradeError),

    #[error("Settlement error: {0}")]
    Settlement(#[from] SettlementError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl MarketError {
    /// Classify the error into authorization / precondition / transport
    pub fn kind(&self) -> ErrorKind {
        match self {
            MarketError::Authorization(_) => ErrorKind::Authorization,
            MarketError::Transport(_) => ErrorKind::Transport,
            MarketError::Trade(TradeError::Transport(_)) => ErrorKind::Transport,
            MarketError::Settlement(SettlementError::Authorization(_)) => ErrorKind::Authorization,
            MarketError::Settlement(SettlementError::Transport(_)) => ErrorKind::Transport,
            _ => ErrorKind::Precondition,
        }
    }
}

// ============================================================================
// Market
// ============================================================================

/// Serialized coordinator for a set of team tokens
#[derive(Debug, Clone)]
pub struct Market {
    config: MarketConfig,
    clock: Clock,
    tokens: BTreeMap<Address, Token>,
    bank: NativeBank,
    events: EventLog,
}

fn lookup<'a>(tokens: &'a BTreeMap<Address, Token>, address: &Address) -> Result<&'a Token, MarketError> {
    tokens
        .get(address)
        .ok_or_else(|| MarketError::UnknownToken(address.clone()))
}

fn lookup_mut<'a>(
    tokens: &'a mut BTreeMap<Address, Token>,
    address: &Address,
) -> Result<&'a mut Token, MarketError> {
    tokens
        .get_mut(address)
        .ok_or_else(|| MarketError::UnknownToken(address.clone()))
}

impl Market {
    /// Create a market from a validated config
    ///
    /// Deploys every configured token and funds every genesis account.
    pub fn new(config: MarketConfig) -> Result<Self, MarketError> {
        config.validate()?;

        let mut bank = NativeBank::new();
        for account in &config.accounts {
            bank.mint(&account.address, account.balance)?;
        }

        let tokens = config
            .tokens
            .iter()
            .map(|token| (token.address.clone(), Token::new(token.clone(), config.rules)))
            .collect();

        info!(
            tokens = config.tokens.len(),
            accounts = config.accounts.len(),
            start_time = config.start_time,
            "market created"
        );

        Ok(Self {
            clock: Clock::new(config.start_time),
            config,
            tokens,
            bank,
            events: EventLog::new(),
        })
    }

    /// Reassemble a market from restored parts (checkpoint load)
    pub(crate) fn from_parts(
        config: MarketConfig,
        clock: Clock,
        tokens: BTreeMap<Address, Token>,
        bank: NativeBank,
    ) -> Self {
        Self {
            config,
            clock,
            tokens,
            bank,
            events: EventLog::new(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn token(&self, address: &Address) -> Option<&Token> {
        self.tokens.get(address)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn num_tokens(&self) -> usize {
        self.tokens.len()
    }

    /// Currency held by a token (zero for unknown addresses)
    pub fn reserve_of(&self, token: &Address) -> u128 {
        self.bank.balance_of(token)
    }

    /// Currency held by any address
    pub fn currency_balance(&self, address: &Address) -> u128 {
        self.bank.balance_of(address)
    }

    pub fn bank(&self) -> &NativeBank {
        &self.bank
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    // ========================================================================
    // Environment
    // ========================================================================

    pub fn advance_time(&mut self, secs: u64) {
        self.clock.advance(secs);
    }

    /// # Panics
    /// Panics if `timestamp` is in the past.
    pub fn advance_time_to(&mut self, timestamp: u64) {
        self.clock.advance_to(timestamp);
    }

    /// Make `address` refuse (or accept again) inbound currency
    pub fn set_rejecting(&mut self, address: &Address, rejecting: bool) {
        self.bank.set_rejecting(address, rejecting);
    }

    // ========================================================================
    // Atomic execution
    // ========================================================================

    /// Run `op` all-or-nothing
    ///
    /// On error, tokens, currency accounts and the event log are restored to
    /// their state before `op` ran.
    fn atomically<T>(
        &mut self,
        operation: &'static str,
        op: impl FnOnce(&mut Self) -> Result<T, MarketError>,
    ) -> Result<T, MarketError> {
        let tokens = self.tokens.clone();
        let bank = self.bank.clone();
        let events = self.events.len();

        let result = op(self);
        if let Err(err) = &result {
            warn!(operation, kind = ?err.kind(), error = %err, "operation rolled back");
            self.tokens = tokens;
            self.bank = bank;
            self.events.truncate(events);
        }
        result
    }

    // ========================================================================
    // Trading
    // ========================================================================

    /// Buy tokens of `token` with `value` currency from `buyer`
    pub fn buy(&mut self, token: &Address, buyer: &Address, value: u128) -> Result<Trade, MarketError> {
        self.atomically("buy", |market| {
            let now = market.clock.now();
            let instance = lookup_mut(&mut market.tokens, token)?;
            let trade = trading::buy(instance, &mut market.bank, buyer, value, now)?;

            debug!(token = %token, buyer = %buyer, minted = %trade.token_amount, value = %value, "buy");
            market.events.log(Event::Buy {
                token: token.clone(),
                from: buyer.clone(),
                token_amount: trade.token_amount,
                currency_amount: trade.currency_amount,
            });
            Ok(trade)
        })
    }

    /// Sell `amount` tokens of `token` held by `seller`
    pub fn sell(&mut self, token: &Address, seller: &Address, amount: u128) -> Result<Trade, MarketError> {
        self.atomically("sell", |market| {
            let now = market.clock.now();
            let instance = lookup_mut(&mut market.tokens, token)?;
            let trade = trading::sell(instance, &mut market.bank, seller, amount, now)?;

            debug!(token = %token, seller = %seller, burned = %amount, payout = %trade.currency_amount, "sell");
            market.events.log(Event::Sell {
                token: token.clone(),
                from: seller.clone(),
                token_amount: trade.token_amount,
                currency_amount: trade.currency_amount,
            });
            Ok(trade)
        })
    }

    /// Plain ledger transfer of `amount` tokens from `from` to `to`
    pub fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> Result<(), MarketError> {
        self.atomically("transfer", |market| {
            let instance = lookup_mut(&mut market.tokens, token)?;
            trading::transfer(instance, from, to, amount)?;

            market.events.log(Event::Transfer {
                token: token.clone(),
                from: from.clone(),
                to: to.clone(),
                amount,
            });
            Ok(())
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Link `token` to `opponent` for a game starting at `start_time`
    ///
    /// Each side's administrator calls this on their own token.
    pub fn begin_game(
        &mut self,
        token: &Address,
        caller: &Address,
        opponent: &Address,
        start_time: Option<u64>,
    ) -> Result<(), MarketError> {
        self.atomically("begin_game", |market| {
            let opponent_known = market.tokens.contains_key(opponent);
            let instance = lookup_mut(&mut market.tokens, token)?;
            instance.ensure_administrator(caller)?;
            if !opponent_known {
                return Err(LifecycleError::InvalidOpponent(opponent.clone()).into());
            }

            let rules = *instance.rules();
            instance
                .lifecycle_mut()
                .begin(token, opponent, start_time, &rules)?;
            let start_time = instance.game_start_time();

            info!(team1 = %token, team2 = %opponent, start_time = ?start_time, "game begun");
            market.events.log(Event::BeginGame {
                team1: token.clone(),
                team2: opponent.clone(),
                start_time,
            });
            Ok(())
        })
    }

    /// Set the stored trading status of `token`
    pub fn change_status(
        &mut self,
        token: &Address,
        caller: &Address,
        status: TradingStatus,
    ) -> Result<(), MarketError> {
        self.atomically("change_status", |market| {
            let instance = lookup_mut(&mut market.tokens, token)?;
            instance.ensure_administrator(caller)?;
            instance.lifecycle_mut().change_status(status)?;

            info!(team = %token, status = %status, "trading status changed");
            market.events.log(Event::ChangeStatus {
                team: token.clone(),
                status,
            });
            Ok(())
        })
    }

    // ========================================================================
    // Settlement
    // ========================================================================

    /// Settle the game between `token` and `opponent`
    ///
    /// Called by `token`'s administrator with `token`'s outcome. Pays the fee,
    /// forwards the plan's value to the opponent, resets both sides and
    /// reprices them. All-or-nothing across both tokens.
    pub fn end_game(
        &mut self,
        token: &Address,
        caller: &Address,
        opponent: &Address,
        outcome: Outcome,
    ) -> Result<SettlementReceipt, MarketError> {
        self.atomically("end_game", |market| {
            lookup(&market.tokens, token)?.ensure_administrator(caller)?;
            if token == opponent {
                return Err(LifecycleError::SelfOpponent.into());
            }
            lookup(&market.tokens, opponent)?;

            // Both instances are taken out of the map for the duration of the
            // protocol; the atomic scope puts them back on any error.
            let (mut initiator, mut peer) = match (
                market.tokens.remove(token),
                market.tokens.remove(opponent),
            ) {
                (Some(initiator), Some(peer)) => (initiator, peer),
                _ => return Err(MarketError::UnknownToken(opponent.clone())),
            };

            let result = settlement::end_game(
                &mut initiator,
                &mut peer,
                &mut market.bank,
                caller,
                opponent,
                outcome,
            );
            market.tokens.insert(token.clone(), initiator);
            market.tokens.insert(opponent.clone(), peer);
            let receipt = result?;

            info!(
                team1 = %token,
                team2 = %opponent,
                outcome = %outcome,
                fee = %receipt.fee,
                value = %receipt.value,
                "game ended"
            );
            market.events.log(Event::EndGame {
                team1: token.clone(),
                team2: opponent.clone(),
                outcome,
            });
            Ok(receipt)
        })
    }

    /// External entry point of the peer-side reset
    ///
    /// `caller` attaches `value` currency. Only the token's registered
    /// opponent is accepted; anyone else is rejected and keeps their funds.
    /// A token address is never accepted as an external caller: a token's
    /// reserve only leaves it through that token's own `end_game`.
    pub fn transfer_fund_and_end_game(
        &mut self,
        token: &Address,
        caller: &Address,
        value: u128,
    ) -> Result<Option<u128>, MarketError> {
        self.atomically("transfer_fund_and_end_game", |market| {
            let instance = lookup(&market.tokens, token)?;
            if market.tokens.contains_key(caller) {
                return Err(AuthorizationError::TokenCaller {
                    token: token.clone(),
                    caller: caller.clone(),
                }
                .into());
            }
            instance
                .ensure_opponent_caller(caller)
                .map_err(SettlementError::from)?;
            if value > 0 {
                market.bank.send(caller, token, value)?;
            }
            let instance = lookup_mut(&mut market.tokens, token)?;
            let repriced = settlement::transfer_fund_and_end_game(instance, &market.bank, caller, value)?;

            info!(token = %token, caller = %caller, value = %value, repriced = ?repriced, "peer reset");
            Ok(repriced)
        })
    }

    // ========================================================================
    // Administration
    // ========================================================================

    /// Sweep the whole reserve of `token` to its fee recipient
    ///
    /// Only allowed strictly after the configured sweep deadline. Bypasses the
    /// settlement protocol entirely.
    pub fn finish(&mut self, token: &Address, caller: &Address) -> Result<u128, MarketError> {
        self.atomically("finish", |market| {
            let now = market.clock.now();
            let instance = lookup(&market.tokens, token)?;
            instance.ensure_administrator(caller)?;

            let deadline = instance.rules().sweep_deadline;
            if now <= deadline {
                return Err(MarketError::SweepBeforeDeadline { now, deadline });
            }

            let recipient = instance.fee_recipient().clone();
            let amount = market.bank.balance_of(token);
            market.bank.send(token, &recipient, amount)?;

            info!(token = %token, recipient = %recipient, amount = %amount, "reserve swept");
            market.events.log(Event::Finish {
                token: token.clone(),
                recipient,
                amount,
            });
            Ok(amount)
        })
    }
}
