//! Checkpoint - Save/Load Market State
//!
//! Serializes the complete market (tokens, ledgers, currency accounts, clock)
//! to JSON so a market can be paused and resumed. The event log is not part
//! of a checkpoint.
//!
//! # Critical Invariants
//!
//! - **Supply Conservation**: each token's recorded supply equals the sum of
//!   its recorded balances
//! - **Currency Conservation**: total currency equals the genesis total
//! - **Opponent Integrity**: every game opponent is a token of the snapshot
//! - **Config Matching**: state can only be loaded with the config it was
//!   saved under

use crate::core::time::Clock;
use crate::lifecycle::{GameLifecycle, TradingStatus};
use crate::models::address::Address;
use crate::models::bank::NativeBank;
use crate::models::ledger::{BalanceLedger, Ledger};
use crate::models::token::{Token, TokenConfig};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

use super::config::MarketConfig;
use super::engine::{Market, MarketError};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete market state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Clock position
    pub now: u64,

    pub tokens: Vec<TokenSnapshot>,

    /// Currency accounts, including token reserves
    pub accounts: Vec<AccountSnapshot>,

    /// Addresses refusing inbound currency
    pub rejecting: Vec<Address>,

    /// SHA256 hash of the config the market was created with
    pub config_hash: String,
}

/// Token state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub config: TokenConfig,
    pub unit_price: u128,
    pub status: TradingStatus,
    pub opponent: Option<Address>,
    pub start_time: Option<u64>,
    pub total_supply: u128,
    pub balances: Vec<AccountSnapshot>,
}

/// One (address, amount) entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub address: Address,
    pub balance: u128,
}

fn entries(pairs: Vec<(Address, u128)>) -> Vec<AccountSnapshot> {
    pairs
        .into_iter()
        .map(|(address, balance)| AccountSnapshot { address, balance })
        .collect()
}

impl From<&Token> for TokenSnapshot {
    fn from(token: &Token) -> Self {
        TokenSnapshot {
            config: token.config().clone(),
            unit_price: token.unit_price(),
            status: token.trading_status(),
            opponent: token.game_opponent().cloned(),
            start_time: token.game_start_time(),
            total_supply: token.total_supply(),
            balances: entries(token.ledger().balances()),
        }
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of a config
///
/// Market configs contain only structs, vectors and ordered maps, so their
/// JSON serialization is already canonical.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, MarketError> {
    let json = serde_json::to_string(config).map_err(|e| {
        MarketError::Serialization(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let result = hasher.finalize();

    Ok(format!("{:x}", result))
}

// ============================================================================
// Validation
// ============================================================================

/// Validate snapshot integrity
pub fn validate_snapshot(
    snapshot: &MarketSnapshot,
    expected_total_currency: u128,
) -> Result<(), MarketError> {
    // 1. Currency conservation
    let mut total_currency: u128 = 0;
    for account in &snapshot.accounts {
        total_currency = total_currency.checked_add(account.balance).ok_or_else(|| {
            MarketError::StateValidation("Currency total overflows".to_string())
        })?;
    }
    if total_currency != expected_total_currency {
        return Err(MarketError::StateValidation(format!(
            "Currency conservation violated: expected {}, got {}",
            expected_total_currency, total_currency
        )));
    }

    // 2. Unique token addresses
    let mut addresses = BTreeSet::new();
    for token in &snapshot.tokens {
        if !addresses.insert(&token.config.address) {
            return Err(MarketError::StateValidation(format!(
                "Duplicate token {}",
                token.config.address
            )));
        }
    }

    for token in &snapshot.tokens {
        // 3. Supply conservation
        let mut sum: u128 = 0;
        for holder in &token.balances {
            sum = sum.checked_add(holder.balance).ok_or_else(|| {
                MarketError::StateValidation(format!("Balances of {} overflow", token.config.address))
            })?;
        }
        if sum != token.total_supply {
            return Err(MarketError::StateValidation(format!(
                "Supply of {} is {} but balances sum to {}",
                token.config.address, token.total_supply, sum
            )));
        }

        // 4. Opponent integrity
        if let Some(opponent) = &token.opponent {
            if opponent == &token.config.address || !addresses.contains(opponent) {
                return Err(MarketError::StateValidation(format!(
                    "Token {} plays unknown opponent {}",
                    token.config.address, opponent
                )));
            }
        }
    }

    Ok(())
}

// ============================================================================
// Save / Load
// ============================================================================

impl Market {
    /// Capture the current state
    pub fn snapshot(&self) -> Result<MarketSnapshot, MarketError> {
        Ok(MarketSnapshot {
            now: self.now(),
            tokens: self.tokens().map(TokenSnapshot::from).collect(),
            accounts: entries(self.bank().accounts()),
            rejecting: self.bank().rejecting_accounts(),
            config_hash: compute_config_hash(self.config())?,
        })
    }

    /// Serialize the current state to JSON
    pub fn save_state(&self) -> Result<String, MarketError> {
        let snapshot = self.snapshot()?;
        serde_json::to_string(&snapshot)
            .map_err(|e| MarketError::Serialization(format!("Snapshot serialization failed: {}", e)))
    }

    /// Restore a market saved with [`Market::save_state`]
    ///
    /// `config` must be the config the saved market was created with.
    pub fn load_state(config: MarketConfig, json: &str) -> Result<Market, MarketError> {
        let snapshot: MarketSnapshot = serde_json::from_str(json)
            .map_err(|e| MarketError::Serialization(format!("Snapshot parse failed: {}", e)))?;
        Self::restore(config, snapshot)
    }

    /// Restore a market from an already parsed snapshot
    pub fn restore(config: MarketConfig, snapshot: MarketSnapshot) -> Result<Market, MarketError> {
        config.validate()?;
        let expected_hash = compute_config_hash(&config)?;
        if snapshot.config_hash != expected_hash {
            return Err(MarketError::StateValidation(
                "Config hash mismatch: snapshot was saved under a different config".to_string(),
            ));
        }
        validate_snapshot(&snapshot, config.genesis_currency()?)?;

        let mut bank = NativeBank::new();
        for account in &snapshot.accounts {
            bank.mint(&account.address, account.balance)?;
        }
        for address in &snapshot.rejecting {
            bank.set_rejecting(address, true);
        }

        let mut tokens = BTreeMap::new();
        for token in snapshot.tokens {
            let ledger = Ledger::from_balances(
                token
                    .balances
                    .into_iter()
                    .map(|holder| (holder.address, holder.balance)),
            )
            .map_err(|e| MarketError::StateValidation(e.to_string()))?;
            debug_assert_eq!(ledger.total_supply(), token.total_supply);

            let lifecycle = GameLifecycle::from_parts(token.status, token.opponent, token.start_time);
            let address = token.config.address.clone();
            let restored = Token::from_parts(token.config, config.rules, token.unit_price, lifecycle, ledger);
            tokens.insert(address, restored);
        }

        info!(now = snapshot.now, tokens = tokens.len(), "market restored");
        Ok(Market::from_parts(config, Clock::new(snapshot.now), tokens, bank))
    }
}
