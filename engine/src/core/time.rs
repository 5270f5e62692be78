//! Time management for the market
//!
//! The market operates on UNIX timestamps in whole seconds. Game start times,
//! the trading freeze window and the sweep deadline are all compared against
//! the clock held here. Time only moves forward.

use serde::{Deserialize, Serialize};

/// Wall clock for a market, in UNIX seconds
///
/// # Example
/// ```
/// use team_token_engine::Clock;
///
/// let mut clock = Clock::new(1_528_000_000);
/// assert_eq!(clock.now(), 1_528_000_000);
///
/// clock.advance(60);
/// assert_eq!(clock.now(), 1_528_000_060);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    /// Current timestamp (seconds since the UNIX epoch)
    now: u64,
}

impl Clock {
    /// Create a clock starting at `start`
    pub fn new(start: u64) -> Self {
        Self { now: start }
    }

    /// Current timestamp
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Move the clock forward by `secs` seconds
    ///
    /// # Example
    /// ```
    /// use team_token_engine::Clock;
    ///
    /// let mut clock = Clock::new(0);
    /// clock.advance(300);
    /// assert_eq!(clock.now(), 300);
    /// ```
    pub fn advance(&mut self, secs: u64) {
        self.now = self.now.saturating_add(secs);
    }

    /// Move the clock forward to `timestamp`
    ///
    /// # Panics
    /// Panics if `timestamp` is earlier than the current time.
    ///
    /// # Example
    /// ```
    /// use team_token_engine::Clock;
    ///
    /// let mut clock = Clock::new(100);
    /// clock.advance_to(250);
    /// assert_eq!(clock.now(), 250);
    /// ```
    pub fn advance_to(&mut self, timestamp: u64) {
        assert!(timestamp >= self.now, "clock cannot move backwards");
        self.now = timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "clock cannot move backwards")]
    fn test_advance_to_past_panics() {
        let mut clock = Clock::new(1_000);
        clock.advance_to(999);
    }

    #[test]
    fn test_advance_saturates() {
        let mut clock = Clock::new(u64::MAX - 1);
        clock.advance(10);
        assert_eq!(clock.now(), u64::MAX);
    }
}
