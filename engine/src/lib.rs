//! Team Token Engine
//!
//! Linked "team" tokens whose price is backed by a currency reserve, with a
//! game lifecycle and a two-phase settlement that moves reserve from the
//! losing team's token to the winner's.
//!
//! # Architecture
//!
//! - **core**: Clock and game rules
//! - **models**: Domain types (Address, Ledger, NativeBank, Token, Event)
//! - **lifecycle**: Trading status and game pairing
//! - **pricing**: Reserve-backed unit price
//! - **trading**: Buy, sell and transfer
//! - **settlement**: Game outcome planning and the two-phase protocol
//! - **market**: Coordinator owning every token, checkpoints, shared handle
//!
//! # Critical Invariants
//!
//! 1. All money values are u128 (smallest currency unit)
//! 2. Token supply always equals the sum of holder balances
//! 3. A failed operation leaves the market exactly as before

// Module declarations
pub mod core;
pub mod lifecycle;
pub mod market;
pub mod models;
pub mod pricing;
pub mod settlement;
pub mod trading;

// Re-exports for convenience
pub use crate::core::rules::GameRules;
pub use crate::core::time::Clock;
pub use lifecycle::{GameLifecycle, LifecycleError, TradingStatus};
pub use market::{
    AccountConfig, ErrorKind, Market, MarketConfig, MarketError, MarketSnapshot, SharedMarket,
};
pub use models::{
    address::Address,
    bank::{CurrencyTransport, NativeBank, TransportError},
    event::{Event, EventLog},
    ledger::{BalanceLedger, Ledger, LedgerError},
    token::{AuthorizationError, Token, TokenConfig},
};
pub use pricing::{implied_price, reprice};
pub use settlement::{
    Outcome, SettlementAck, SettlementError, SettlementReceipt, SettlementRequest,
};
pub use trading::{Trade, TradeError};
