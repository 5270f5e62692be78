//! Market: the coordinator that owns every token and runs operations
//!
//! - `config`: genesis configuration
//! - `engine`: the `Market` itself and its error taxonomy
//! - `checkpoint`: save/load of complete market state
//! - `shared`: mutex-guarded handle for multi-threaded callers

pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod shared;

pub use checkpoint::{
    compute_config_hash, validate_snapshot, AccountSnapshot, MarketSnapshot, TokenSnapshot,
};
pub use config::{AccountConfig, MarketConfig};
pub use engine::{ErrorKind, Market, MarketError};
pub use shared::SharedMarket;
