//! Market configuration
//!
//! A market is described entirely by a [`MarketConfig`]: the clock start,
//! the shared [`GameRules`], the tokens to deploy and the genesis currency
//! balances. Configs are usually loaded from JSON.

use crate::core::rules::GameRules;
use crate::models::address::Address;
use crate::models::token::TokenConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::engine::MarketError;

/// Genesis currency balance of one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub address: Address,
    pub balance: u128,
}

/// Complete market configuration
///
/// # Example
/// ```
/// use team_token_engine::MarketConfig;
///
/// let config = MarketConfig::from_json(r#"{
///     "start_time": 1520000000,
///     "tokens": [
///         {
///             "address": "TEAM_BRA",
///             "name": "Brazil",
///             "symbol": "BRA",
///             "administrator": "ADMIN",
///             "fee_recipient": "TREASURY",
///             "initial_price": 1000
///         }
///     ],
///     "accounts": [{ "address": "ALICE", "balance": 50000 }]
/// }"#).unwrap();
///
/// assert_eq!(config.tokens.len(), 1);
/// assert_eq!(config.rules.fee_divisor, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Initial clock value (UNIX seconds)
    pub start_time: u64,

    #[serde(default)]
    pub rules: GameRules,

    pub tokens: Vec<TokenConfig>,

    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

impl MarketConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, MarketError> {
        let config: MarketConfig = serde_json::from_str(json)
            .map_err(|e| MarketError::Serialization(format!("Config parse failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Total currency created at genesis
    pub fn genesis_currency(&self) -> Result<u128, MarketError> {
        self.accounts.iter().try_fold(0u128, |total, account| {
            total
                .checked_add(account.balance)
                .ok_or_else(|| MarketError::InvalidConfig("Genesis balances overflow".to_string()))
        })
    }

    pub fn validate(&self) -> Result<(), MarketError> {
        let rules = &self.rules;
        if rules.fee_divisor == 0 {
            return Err(MarketError::InvalidConfig("fee_divisor must be positive".to_string()));
        }
        if rules.start_window_open >= rules.start_window_close {
            return Err(MarketError::InvalidConfig(format!(
                "start window is empty: ({}, {})",
                rules.start_window_open, rules.start_window_close
            )));
        }

        let mut token_addresses = BTreeSet::new();
        for token in &self.tokens {
            for (field, address) in [
                ("address", &token.address),
                ("administrator", &token.administrator),
                ("fee_recipient", &token.fee_recipient),
            ] {
                if address.is_empty() {
                    return Err(MarketError::InvalidConfig(format!(
                        "token {} has an empty {}",
                        token.symbol, field
                    )));
                }
            }
            if token.initial_price == 0 {
                return Err(MarketError::InvalidConfig(format!(
                    "token {} has a zero initial price",
                    token.address
                )));
            }
            if !token_addresses.insert(&token.address) {
                return Err(MarketError::InvalidConfig(format!(
                    "duplicate token address {}",
                    token.address
                )));
            }
        }

        let mut accounts = BTreeSet::new();
        for account in &self.accounts {
            if account.address.is_empty() {
                return Err(MarketError::InvalidConfig("account with empty address".to_string()));
            }
            if !accounts.insert(&account.address) {
                return Err(MarketError::InvalidConfig(format!(
                    "duplicate account {}",
                    account.address
                )));
            }
        }
        self.genesis_currency()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(address: &str, price: u128) -> TokenConfig {
        TokenConfig {
            address: Address::new(address),
            name: address.to_string(),
            symbol: address.to_string(),
            decimals: 0,
            administrator: Address::new("ADMIN"),
            fee_recipient: Address::new("TREASURY"),
            initial_price: price,
        }
    }

    fn config(tokens: Vec<TokenConfig>) -> MarketConfig {
        MarketConfig {
            start_time: 0,
            rules: GameRules::default(),
            tokens,
            accounts: vec![],
        }
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let result = config(vec![token("TEAM_A", 1), token("TEAM_A", 1)]).validate();

        assert!(matches!(result, Err(MarketError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_price_rejected() {
        let result = config(vec![token("TEAM_A", 0)]).validate();

        assert!(matches!(result, Err(MarketError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_fee_divisor_rejected() {
        let mut cfg = config(vec![token("TEAM_A", 1)]);
        cfg.rules.fee_divisor = 0;

        assert!(matches!(cfg.validate(), Err(MarketError::InvalidConfig(_))));
    }

    #[test]
    fn test_genesis_overflow_rejected() {
        let mut cfg = config(vec![]);
        cfg.accounts = vec![
            AccountConfig {
                address: Address::new("ALICE"),
                balance: u128::MAX,
            },
            AccountConfig {
                address: Address::new("BOB"),
                balance: 1,
            },
        ];

        assert!(matches!(cfg.validate(), Err(MarketError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result = MarketConfig::from_json("{ not json");

        assert!(matches!(result, Err(MarketError::Serialization(_))));
    }

    #[test]
    fn test_partial_rules_use_defaults() {
        let cfg = MarketConfig::from_json(
            r#"{ "start_time": 5, "rules": { "fee_divisor": 10 }, "tokens": [] }"#,
        )
        .unwrap();

        assert_eq!(cfg.rules.fee_divisor, 10);
        assert_eq!(cfg.rules.freeze_window_secs, 300);
    }
}
