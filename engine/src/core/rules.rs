//! Fixed rules shared by every token in a market
//!
//! Timestamps are UNIX seconds. The defaults describe a single tournament
//! season running through calendar year 2018.

use serde::{Deserialize, Serialize};

/// 2018-01-01T00:00:00Z
pub const SEASON_OPEN: u64 = 1_514_764_800;

/// 2019-01-01T00:00:00Z
pub const SEASON_CLOSE: u64 = 1_546_300_800;

/// Trading is blocked this many seconds before a timed game starts
pub const FREEZE_WINDOW_SECS: u64 = 300;

/// Settlement fee is `amount / FEE_DIVISOR` (5%)
pub const FEE_DIVISOR: u128 = 20;

/// Rules applied by the lifecycle, settlement and sweep operations
///
/// # Example
/// ```
/// use team_token_engine::GameRules;
///
/// let rules = GameRules::default();
/// assert_eq!(rules.freeze_window_secs, 300);
/// assert_eq!(rules.fee_divisor, 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Length of the pre-game trading freeze
    pub freeze_window_secs: u64,

    /// Start times above this value denote a real scheduled game; only those
    /// activate the freeze window
    pub timed_game_threshold: u64,

    /// Exclusive lower bound for a game start time
    pub start_window_open: u64,

    /// Exclusive upper bound for a game start time
    pub start_window_close: u64,

    /// The reserve sweep is allowed strictly after this time
    pub sweep_deadline: u64,

    /// Settlement fee divisor
    pub fee_divisor: u128,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            freeze_window_secs: FREEZE_WINDOW_SECS,
            timed_game_threshold: SEASON_OPEN,
            start_window_open: SEASON_OPEN,
            start_window_close: SEASON_CLOSE,
            sweep_deadline: SEASON_CLOSE,
            fee_divisor: FEE_DIVISOR,
        }
    }
}

impl GameRules {
    /// Whether `start_time` may be used to schedule a game
    pub fn accepts_start_time(&self, start_time: u64) -> bool {
        start_time > self.start_window_open && start_time < self.start_window_close
    }

    /// Whether a game starting at `start_time` blocks trading at `now`
    pub fn in_freeze_window(&self, start_time: u64, now: u64) -> bool {
        start_time > self.timed_game_threshold
            && now.saturating_add(self.freeze_window_secs) >= start_time
    }
}
