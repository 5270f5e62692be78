//! Game lifecycle state machine
//!
//! Tracks whether a token is idle or linked to an opponent for a game, and
//! gates trading. A token cycles `idle → begin → active → reset → idle`
//! indefinitely; `reset` is driven by the settlement engine.
//!
//! # Trading Gates
//!
//! Buy and sell must pass both gates:
//! 1. The stored status is `Open`
//! 2. If a timed game is scheduled, `now` is outside the freeze window before
//!    its start (see [`GameRules::in_freeze_window`])

use crate::core::rules::GameRules;
use crate::models::address::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Administrative trading switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TradingStatus {
    #[default]
    Open,
    Frozen,
}

impl fmt::Display for TradingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingStatus::Open => f.write_str("Open"),
            TradingStatus::Frozen => f.write_str("Frozen"),
        }
    }
}

/// Errors raised by lifecycle transitions and trading gates
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("A token cannot play against itself")]
    SelfOpponent,

    #[error("Opponent {0} is not a valid token")]
    InvalidOpponent(Address),

    #[error("A game against {opponent} is already active")]
    GameAlreadyActive { opponent: Address },

    #[error("Start time {start_time} is outside the allowed window")]
    StartTimeOutOfWindow { start_time: u64 },

    #[error("Trading status is already {0}")]
    StatusUnchanged(TradingStatus),

    #[error("Trading is frozen")]
    TradingFrozen,

    #[error("Trading is closed {freeze_window_secs}s before the game at {start_time} (now {now})")]
    FreezeWindow {
        start_time: u64,
        now: u64,
        freeze_window_secs: u64,
    },

    #[error("No game is active")]
    NoActiveGame,

    #[error("Opponent mismatch: game is against {expected}, got {given}")]
    OpponentMismatch { expected: Address, given: Address },
}

/// Lifecycle state of one token
///
/// # Example
/// ```
/// use team_token_engine::{Address, GameLifecycle, GameRules};
///
/// let rules = GameRules::default();
/// let mut lifecycle = GameLifecycle::new();
/// lifecycle
///     .begin(&Address::new("TEAM_A"), &Address::new("TEAM_B"), Some(1_530_000_000), &rules)
///     .unwrap();
///
/// assert!(lifecycle.is_in_game());
/// assert!(lifecycle.ensure_trading_open(1_529_000_000, &rules).is_ok());
/// assert!(lifecycle.ensure_trading_open(1_529_999_800, &rules).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLifecycle {
    status: TradingStatus,
    opponent: Option<Address>,
    start_time: Option<u64>,
}

impl GameLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore lifecycle state (checkpoint restore)
    pub fn from_parts(status: TradingStatus, opponent: Option<Address>, start_time: Option<u64>) -> Self {
        Self {
            status,
            opponent,
            start_time: start_time.filter(|t| *t != 0),
        }
    }

    pub fn status(&self) -> TradingStatus {
        self.status
    }

    pub fn opponent(&self) -> Option<&Address> {
        self.opponent.as_ref()
    }

    pub fn start_time(&self) -> Option<u64> {
        self.start_time
    }

    pub fn is_in_game(&self) -> bool {
        self.opponent.is_some()
    }

    /// Link this token (`own`) to `opponent`
    ///
    /// A start time of `None` or `Some(0)` leaves the game untimed. Trading is
    /// reopened on success.
    pub fn begin(
        &mut self,
        own: &Address,
        opponent: &Address,
        start_time: Option<u64>,
        rules: &GameRules,
    ) -> Result<(), LifecycleError> {
        if opponent == own {
            return Err(LifecycleError::SelfOpponent);
        }
        if opponent.is_empty() {
            return Err(LifecycleError::InvalidOpponent(opponent.clone()));
        }
        if let Some(current) = &self.opponent {
            return Err(LifecycleError::GameAlreadyActive {
                opponent: current.clone(),
            });
        }

        let start_time = start_time.filter(|t| *t != 0);
        if let Some(t) = start_time {
            if !rules.accepts_start_time(t) {
                return Err(LifecycleError::StartTimeOutOfWindow { start_time: t });
            }
        }

        self.opponent = Some(opponent.clone());
        self.start_time = start_time;
        self.status = TradingStatus::Open;
        Ok(())
    }

    /// Flip the stored trading status; a no-op change is rejected
    pub fn change_status(&mut self, status: TradingStatus) -> Result<(), LifecycleError> {
        if status == self.status {
            return Err(LifecycleError::StatusUnchanged(status));
        }
        self.status = status;
        Ok(())
    }

    /// Check both trading gates at time `now`
    pub fn ensure_trading_open(&self, now: u64, rules: &GameRules) -> Result<(), LifecycleError> {
        if self.status == TradingStatus::Frozen {
            return Err(LifecycleError::TradingFrozen);
        }
        if let Some(start_time) = self.start_time {
            if rules.in_freeze_window(start_time, now) {
                return Err(LifecycleError::FreezeWindow {
                    start_time,
                    now,
                    freeze_window_secs: rules.freeze_window_secs,
                });
            }
        }
        Ok(())
    }

    /// Check that a game is active and that it is against `expected`
    pub fn ensure_opponent(&self, expected: &Address) -> Result<(), LifecycleError> {
        match &self.opponent {
            None => Err(LifecycleError::NoActiveGame),
            Some(current) if current != expected => Err(LifecycleError::OpponentMismatch {
                expected: current.clone(),
                given: expected.clone(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Return to idle: no opponent, no start time, trading open
    pub fn reset(&mut self) {
        self.opponent = None;
        self.start_time = None;
        self.status = TradingStatus::Open;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KICKOFF: u64 = 1_530_000_000;

    fn addr(id: &str) -> Address {
        Address::new(id)
    }

    fn active() -> GameLifecycle {
        let mut lifecycle = GameLifecycle::new();
        lifecycle
            .begin(&addr("TEAM_A"), &addr("TEAM_B"), Some(KICKOFF), &GameRules::default())
            .unwrap();
        lifecycle
    }

    #[test]
    fn test_begin_reopens_frozen_trading() {
        let mut lifecycle = GameLifecycle::new();
        lifecycle.change_status(TradingStatus::Frozen).unwrap();

        lifecycle
            .begin(&addr("TEAM_A"), &addr("TEAM_B"), None, &GameRules::default())
            .unwrap();

        assert_eq!(lifecycle.status(), TradingStatus::Open);
        assert_eq!(lifecycle.start_time(), None);
    }

    #[test]
    fn test_zero_start_time_is_untimed() {
        let mut lifecycle = GameLifecycle::new();
        lifecycle
            .begin(&addr("TEAM_A"), &addr("TEAM_B"), Some(0), &GameRules::default())
            .unwrap();

        assert_eq!(lifecycle.start_time(), None);
    }

    #[test]
    fn test_second_begin_rejected() {
        let mut lifecycle = active();

        let result = lifecycle.begin(&addr("TEAM_A"), &addr("TEAM_C"), None, &GameRules::default());

        assert_eq!(
            result,
            Err(LifecycleError::GameAlreadyActive {
                opponent: addr("TEAM_B")
            })
        );
        assert_eq!(lifecycle.opponent(), Some(&addr("TEAM_B")));
    }

    #[test]
    fn test_ensure_opponent() {
        let lifecycle = active();

        assert!(lifecycle.ensure_opponent(&addr("TEAM_B")).is_ok());
        assert!(matches!(
            lifecycle.ensure_opponent(&addr("TEAM_C")),
            Err(LifecycleError::OpponentMismatch { .. })
        ));
        assert_eq!(
            GameLifecycle::new().ensure_opponent(&addr("TEAM_B")),
            Err(LifecycleError::NoActiveGame)
        );
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut lifecycle = active();
        lifecycle.change_status(TradingStatus::Frozen).unwrap();

        lifecycle.reset();

        assert_eq!(lifecycle, GameLifecycle::new());
    }
}
