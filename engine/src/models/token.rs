//! Team token instance
//!
//! One token per team. A token owns its balance ledger, its current unit
//! price and its game lifecycle. Its reserve is not stored here: it is the
//! currency held at the token's own address in the market's currency
//! transport.
//!
//! Identity fields (`address`, `name`, `symbol`, `decimals`, `administrator`,
//! `fee_recipient`) are fixed at deployment.

use crate::core::rules::GameRules;
use crate::lifecycle::{GameLifecycle, TradingStatus};
use crate::models::address::Address;
use crate::models::ledger::{BalanceLedger, Ledger};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Caller is not allowed to perform the operation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("{caller} is not the administrator of {token}")]
    NotAdministrator { token: Address, caller: Address },

    #[error("{caller} is not the registered opponent of {token}")]
    NotOpponent { token: Address, caller: Address },

    #[error("Token {caller} can only reach {token} through end_game")]
    TokenCaller { token: Address, caller: Address },
}

/// Deployment parameters of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Address of the token itself (also its reserve account)
    pub address: Address,

    pub name: String,

    pub symbol: String,

    #[serde(default)]
    pub decimals: u8,

    /// Identity allowed to begin/end games, change status and sweep
    pub administrator: Address,

    /// Receives settlement fees and the deadline sweep
    pub fee_recipient: Address,

    /// Starting unit price (currency units per token unit)
    pub initial_price: u128,
}

/// A deployed team token
///
/// # Example
/// ```
/// use team_token_engine::{Address, GameRules, Token, TokenConfig};
///
/// let token: Token = Token::new(
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
/// assert_eq!(token.unit_price(), 1_000);
/// assert_eq!(token.total_supply(), 0);
/// assert!(!token.is_in_game());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<L = Ledger> {
    config: TokenConfig,
    rules: GameRules,
    unit_price: u128,
    lifecycle: GameLifecycle,
    ledger: L,
}

impl<L: BalanceLedger + Default> Token<L> {
    /// Deploy a fresh token with an empty ledger
    pub fn new(config: TokenConfig, rules: GameRules) -> Self {
        let unit_price = config.initial_price;
        Self {
            config,
            rules,
            unit_price,
            lifecycle: GameLifecycle::new(),
            ledger: L::default(),
        }
    }
}

impl<L: BalanceLedger> Token<L> {
    /// Reassemble a token from persisted parts (checkpoint restore)
    pub fn from_parts(
        config: TokenConfig,
        rules: GameRules,
        unit_price: u128,
        lifecycle: GameLifecycle,
        ledger: L,
    ) -> Self {
        Self {
            config,
            rules,
            unit_price,
            lifecycle,
            ledger,
        }
    }

    pub fn address(&self) -> &Address {
        &self.config.address
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    pub fn administrator(&self) -> &Address {
        &self.config.administrator
    }

    pub fn fee_recipient(&self) -> &Address {
        &self.config.fee_recipient
    }

    pub fn initial_price(&self) -> u128 {
        self.config.initial_price
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn unit_price(&self) -> u128 {
        self.unit_price
    }

    pub(crate) fn set_unit_price(&mut self, price: u128) {
        self.unit_price = price;
    }

    pub fn lifecycle(&self) -> &GameLifecycle {
        &self.lifecycle
    }

    pub(crate) fn lifecycle_mut(&mut self) -> &mut GameLifecycle {
        &mut self.lifecycle
    }

    pub fn trading_status(&self) -> TradingStatus {
        self.lifecycle.status()
    }

    pub fn game_opponent(&self) -> Option<&Address> {
        self.lifecycle.opponent()
    }

    pub fn game_start_time(&self) -> Option<u64> {
        self.lifecycle.start_time()
    }

    pub fn is_in_game(&self) -> bool {
        self.lifecycle.is_in_game()
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub(crate) fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn balance_of(&self, holder: &Address) -> u128 {
        self.ledger.balance_of(holder)
    }

    pub fn total_supply(&self) -> u128 {
        self.ledger.total_supply()
    }

    /// Fail unless `caller` is this token's administrator
    pub fn ensure_administrator(&self, caller: &Address) -> Result<(), AuthorizationError> {
        if caller != &self.config.administrator {
            return Err(AuthorizationError::NotAdministrator {
                token: self.config.address.clone(),
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Fail unless `caller` is the opponent of the active game
    pub fn ensure_opponent_caller(&self, caller: &Address) -> Result<(), AuthorizationError> {
        if self.lifecycle.opponent() != Some(caller) {
            return Err(AuthorizationError::NotOpponent {
                token: self.config.address.clone(),
                caller: caller.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::new(
            TokenConfig {
                address: Address::new("TEAM_A"),
                name: "Team A".to_string(),
                symbol: "TA".to_string(),
                decimals: 0,
                administrator: Address::new("ADMIN"),
                fee_recipient: Address::new("TREASURY"),
                initial_price: 1_000,
            },
            GameRules::default(),
        )
    }

    #[test]
    fn test_only_administrator_passes() {
        let token = token();

        assert!(token.ensure_administrator(&Address::new("ADMIN")).is_ok());
        assert_eq!(
            token.ensure_administrator(&Address::new("MALLORY")),
            Err(AuthorizationError::NotAdministrator {
                token: Address::new("TEAM_A"),
                caller: Address::new("MALLORY"),
            })
        );
    }

    #[test]
    fn test_opponent_caller_requires_active_game() {
        let mut token = token();
        assert!(token.ensure_opponent_caller(&Address::new("TEAM_B")).is_err());

        token
            .lifecycle_mut()
            .begin(&Address::new("TEAM_A"), &Address::new("TEAM_B"), None, &GameRules::default())
            .unwrap();

        assert!(token.ensure_opponent_caller(&Address::new("TEAM_B")).is_ok());
        assert!(token.ensure_opponent_caller(&Address::new("TEAM_C")).is_err());
    }
}
