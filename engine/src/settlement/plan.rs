//! Settlement planning
//!
//! Pure computation of how much of the initiator's reserve moves, and where,
//! for a given outcome. Nothing is mutated here.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::protocol::SettlementError;

/// Reported result of a game, from the initiator's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Never accepted for settlement; the winner waits for the loser
    Win,
    Lose,
    Draw,
    Cancel,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Win => "Win",
            Outcome::Lose => "Lose",
            Outcome::Draw => "Draw",
            Outcome::Cancel => "Cancel",
        };
        f.write_str(name)
    }
}

/// Reserve and supply of one side at planning time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveView {
    pub reserve: u128,
    pub supply: u128,
}

/// Currency movements decided for a settlement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPlan {
    pub outcome: Outcome,

    /// Paid to the initiator's fee recipient
    pub fee: u128,

    /// Sent to the peer together with the settlement request
    pub value: u128,
}

impl SettlementPlan {
    fn empty(outcome: Outcome) -> Self {
        Self {
            outcome,
            fee: 0,
            value: 0,
        }
    }

    /// Total leaving the initiator's reserve
    pub fn total_outflow(&self) -> u128 {
        self.fee + self.value
    }
}

/// Decide the fee and forwarded value for `outcome`
///
/// - **Lose**: the whole reserve moves (if the initiator has supply)
/// - **Draw**: half the reserve difference moves; the initiator must hold at
///   least as much as the opponent
/// - **Cancel**: nothing moves
///
/// Moved amounts pay `amount / fee_divisor` to the fee recipient and forward
/// the rest, unless the opponent has no supply, in which case the whole
/// amount is taken as fee.
///
/// # Example
///
/// ```rust
/// use team_token_engine::settlement::{plan_settlement, Outcome, ReserveView};
///
/// let own = ReserveView { reserve: 100, supply: 10 };
/// let opponent = ReserveView { reserve: 40, supply: 4 };
///
/// let plan = plan_settlement(Outcome::Lose, own, opponent, 20).unwrap();
/// assert_eq!(plan.fee, 5);
/// assert_eq!(plan.value, 95);
/// ```
pub fn plan_settlement(
    outcome: Outcome,
    own: ReserveView,
    opponent: ReserveView,
    fee_divisor: u128,
) -> Result<SettlementPlan, SettlementError> {
    match outcome {
        Outcome::Win => Err(SettlementError::WinNotSelfReported),
        Outcome::Cancel => Ok(SettlementPlan::empty(outcome)),
        Outcome::Lose => {
            if own.reserve == 0 || own.supply == 0 {
                return Ok(SettlementPlan::empty(outcome));
            }
            Ok(split(outcome, own.reserve, opponent.supply, fee_divisor))
        }
        Outcome::Draw => {
            let delta = own.reserve.checked_sub(opponent.reserve).ok_or(
                SettlementError::DrawReserveBelowOpponent {
                    own: own.reserve,
                    opponent: opponent.reserve,
                },
            )?;
            let amount = delta / 2;
            if amount == 0 {
                return Ok(SettlementPlan::empty(outcome));
            }
            Ok(split(outcome, amount, opponent.supply, fee_divisor))
        }
    }
}

fn split(outcome: Outcome, amount: u128, opponent_supply: u128, fee_divisor: u128) -> SettlementPlan {
    if opponent_supply == 0 {
        return SettlementPlan {
            outcome,
            fee: amount,
            value: 0,
        };
    }
    let fee = amount.checked_div(fee_divisor).unwrap_or(0);
    SettlementPlan {
        outcome,
        fee,
        value: amount - fee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(reserve: u128, supply: u128) -> ReserveView {
        ReserveView { reserve, supply }
    }

    #[test]
    fn test_win_rejected() {
        assert_eq!(
            plan_settlement(Outcome::Win, view(100, 1), view(100, 1), 20),
            Err(SettlementError::WinNotSelfReported)
        );
    }

    #[test]
    fn test_lose_to_empty_opponent_takes_everything_as_fee() {
        let plan = plan_settlement(Outcome::Lose, view(100, 10), view(0, 0), 20).unwrap();

        assert_eq!(plan.fee, 100);
        assert_eq!(plan.value, 0);
    }

    #[test]
    fn test_lose_without_own_supply_moves_nothing() {
        let plan = plan_settlement(Outcome::Lose, view(100, 0), view(50, 5), 20).unwrap();

        assert_eq!(plan.total_outflow(), 0);
    }

    #[test]
    fn test_lose_fee_truncates() {
        let plan = plan_settlement(Outcome::Lose, view(39, 1), view(0, 1), 20).unwrap();

        assert_eq!(plan.fee, 1);
        assert_eq!(plan.value, 38);
    }

    #[test]
    fn test_draw_moves_half_the_difference() {
        let plan = plan_settlement(Outcome::Draw, view(300, 3), view(100, 1), 20).unwrap();

        assert_eq!(plan.fee, 5);
        assert_eq!(plan.value, 95);
    }

    #[test]
    fn test_draw_from_smaller_side_rejected() {
        assert_eq!(
            plan_settlement(Outcome::Draw, view(99, 1), view(100, 1), 20),
            Err(SettlementError::DrawReserveBelowOpponent {
                own: 99,
                opponent: 100
            })
        );
    }

    #[test]
    fn test_draw_off_by_one_moves_nothing() {
        let plan = plan_settlement(Outcome::Draw, view(101, 1), view(100, 1), 20).unwrap();

        assert_eq!(plan.total_outflow(), 0);
    }

    #[test]
    fn test_cancel_moves_nothing() {
        let plan = plan_settlement(Outcome::Cancel, view(1_000, 10), view(0, 0), 20).unwrap();

        assert_eq!(plan, SettlementPlan::empty(Outcome::Cancel));
    }
}
