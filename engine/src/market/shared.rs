//! Thread-shareable market handle.
//!
//! Operations from several threads are serialized through one mutex, held for
//! the whole operation.

use parking_lot::Mutex;
use std::sync::Arc;

use super::config::MarketConfig;
use super::engine::{Market, MarketError};

/// Cloneable handle to a single market
#[derive(Debug, Clone)]
pub struct SharedMarket {
    inner: Arc<Mutex<Market>>,
}

impl SharedMarket {
    pub fn new(market: Market) -> Self {
        Self {
            inner: Arc::new(Mutex::new(market)),
        }
    }

    pub fn from_config(config: MarketConfig) -> Result<Self, MarketError> {
        Ok(Self::new(Market::new(config)?))
    }

    /// Run `f` with exclusive access to the market
    pub fn with<T>(&self, f: impl FnOnce(&mut Market) -> T) -> T {
        let mut market = self.inner.lock();
        f(&mut market)
    }

    /// Copy of the current market state
    pub fn snapshot(&self) -> Market {
        self.inner.lock().clone()
    }
}

impl From<Market> for SharedMarket {
    fn from(market: Market) -> Self {
        Self::new(market)
    }
}
