//! end_game / transfer_fund_and_end_game protocol
//!
//! Each phase is exposed on its own so the request/ack hand-off between the
//! two tokens is explicit. [`end_game`] runs the phases in order.
//!
//! The functions here do not undo their own partial effects: if a later
//! phase fails, earlier currency movements remain. Callers must run
//! [`end_game`] inside an all-or-nothing scope (see `Market::end_game`).

use crate::lifecycle::LifecycleError;
use crate::models::address::Address;
use crate::models::bank::{CurrencyTransport, TransportError};
use crate::models::ledger::BalanceLedger;
use crate::models::token::{AuthorizationError, Token};
use crate::pricing;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::plan::{plan_settlement, Outcome, ReserveView};

/// Errors that can occur while ending a game
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Win is never self-reported; the losing side settles")]
    WinNotSelfReported,

    #[error("Draw must be settled by the side with the larger reserve: own {own}, opponent {opponent}")]
    DrawReserveBelowOpponent { own: u128, opponent: u128 },

    #[error("Settlement request for {expected} delivered to {actual}")]
    MisdirectedRequest { expected: Address, actual: Address },

    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Settlement call sent from the initiator to its peer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementRequest {
    pub id: Uuid,

    /// Initiating token
    pub from: Address,

    /// Peer token
    pub to: Address,

    pub outcome: Outcome,

    /// Paid to `fee_recipient` before the peer is called
    pub fee: u128,

    pub fee_recipient: Address,

    /// Currency attached to the call
    pub value: u128,
}

/// Peer confirmation that it received the funds and reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementAck {
    pub request_id: Uuid,

    pub peer: Address,

    /// New peer price, if the peer repriced
    pub repriced: Option<u128>,
}

/// Summary of a completed settlement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReceipt {
    pub request_id: Uuid,
    pub initiator: Address,
    pub opponent: Address,
    pub outcome: Outcome,
    pub fee: u128,
    pub value: u128,
    pub initiator_price: Option<u128>,
    pub opponent_price: Option<u128>,
}

fn reserve_view<L: BalanceLedger, T: CurrencyTransport>(token: &Token<L>, transport: &T) -> ReserveView {
    ReserveView {
        reserve: transport.balance_of(token.address()),
        supply: token.total_supply(),
    }
}

/// Phase 1: authorize the initiator and plan the currency movements
pub fn prepare_end_game<L: BalanceLedger, T: CurrencyTransport>(
    initiator: &Token<L>,
    peer: &Token<L>,
    transport: &T,
    caller: &Address,
    opponent: &Address,
    outcome: Outcome,
) -> Result<SettlementRequest, SettlementError> {
    initiator.ensure_administrator(caller)?;
    initiator.lifecycle().ensure_opponent(opponent)?;
    if peer.address() != opponent {
        return Err(SettlementError::MisdirectedRequest {
            expected: opponent.clone(),
            actual: peer.address().clone(),
        });
    }

    let plan = plan_settlement(
        outcome,
        reserve_view(initiator, transport),
        reserve_view(peer, transport),
        initiator.rules().fee_divisor,
    )?;

    Ok(SettlementRequest {
        id: Uuid::new_v4(),
        from: initiator.address().clone(),
        to: opponent.clone(),
        outcome,
        fee: plan.fee,
        fee_recipient: initiator.fee_recipient().clone(),
        value: plan.value,
    })
}

/// Peer-side reset after receiving `value` from `caller`
///
/// Only the registered opponent may call this. The attached value must
/// already be in the token's reserve. The price is recomputed only when value
/// was received and the token has supply; the lifecycle is always reset.
pub fn transfer_fund_and_end_game<L: BalanceLedger, T: CurrencyTransport>(
    token: &mut Token<L>,
    transport: &T,
    caller: &Address,
    value: u128,
) -> Result<Option<u128>, SettlementError> {
    token.ensure_opponent_caller(caller)?;

    let repriced = if value > 0 {
        let reserve = transport.balance_of(token.address());
        pricing::reprice(token, reserve)
    } else {
        None
    };
    token.lifecycle_mut().reset();
    Ok(repriced)
}

/// Phase 4: deliver `request` to the peer
pub fn apply_settlement<L: BalanceLedger, T: CurrencyTransport>(
    peer: &mut Token<L>,
    transport: &T,
    request: &SettlementRequest,
) -> Result<SettlementAck, SettlementError> {
    if peer.address() != &request.to {
        return Err(SettlementError::MisdirectedRequest {
            expected: request.to.clone(),
            actual: peer.address().clone(),
        });
    }
    let repriced = transfer_fund_and_end_game(peer, transport, &request.from, request.value)?;
    Ok(SettlementAck {
        request_id: request.id,
        peer: peer.address().clone(),
        repriced,
    })
}

/// Phase 5: reset the initiator and reprice it from what is left
pub fn finalize_end_game<L: BalanceLedger, T: CurrencyTransport>(
    initiator: &mut Token<L>,
    transport: &T,
    request: SettlementRequest,
    ack: SettlementAck,
) -> SettlementReceipt {
    initiator.lifecycle_mut().reset();
    let reserve = transport.balance_of(initiator.address());
    let initiator_price = pricing::reprice(initiator, reserve);

    SettlementReceipt {
        request_id: request.id,
        initiator: request.from,
        opponent: request.to,
        outcome: request.outcome,
        fee: request.fee,
        value: request.value,
        initiator_price,
        opponent_price: ack.repriced,
    }
}

/// Run the full settlement: prepare, pay fee, call peer, finalize
///
/// The fee is paid before the peer is called, and the peer is called before
/// the initiator resets, so the initiator's new price already reflects every
/// outflow.
pub fn end_game<L: BalanceLedger, T: CurrencyTransport>(
    initiator: &mut Token<L>,
    peer: &mut Token<L>,
    transport: &mut T,
    caller: &Address,
    opponent: &Address,
    outcome: Outcome,
) -> Result<SettlementReceipt, SettlementError> {
    let request = prepare_end_game(initiator, peer, transport, caller, opponent, outcome)?;
    debug!(
        request_id = %request.id,
        from = %request.from,
        to = %request.to,
        outcome = %request.outcome,
        fee = %request.fee,
        value = %request.value,
        "settlement planned"
    );

    if request.fee > 0 {
        transport.send(&request.from, &request.fee_recipient, request.fee)?;
    }
    transport.send(&request.from, &request.to, request.value)?;

    let ack = apply_settlement(peer, transport, &request)?;
    Ok(finalize_end_game(initiator, transport, request, ack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rules::GameRules;
    use crate::models::bank::NativeBank;
    use crate::models::token::TokenConfig;

    fn addr(id: &str) -> Address {
        Address::new(id)
    }

    fn team(id: &str) -> Token {
        Token::new(
            TokenConfig {
                address: addr(id),
                name: id.to_string(),
                symbol: id.to_string(),
                decimals: 0,
                administrator: addr("ADMIN"),
                fee_recipient: addr("TREASURY"),
                initial_price: 10,
            },
            GameRules::default(),
        )
    }

    fn linked() -> (Token, Token) {
        let mut a = team("TEAM_A");
        let mut b = team("TEAM_B");
        let rules = GameRules::default();
        a.lifecycle_mut()
            .begin(&addr("TEAM_A"), &addr("TEAM_B"), None, &rules)
            .unwrap();
        b.lifecycle_mut()
            .begin(&addr("TEAM_B"), &addr("TEAM_A"), None, &rules)
            .unwrap();
        (a, b)
    }

    #[test]
    fn test_prepare_requires_administrator() {
        let (a, b) = linked();
        let bank = NativeBank::new();

        let result = prepare_end_game(&a, &b, &bank, &addr("MALLORY"), &addr("TEAM_B"), Outcome::Lose);

        assert!(matches!(
            result,
            Err(SettlementError::Authorization(AuthorizationError::NotAdministrator { .. }))
        ));
    }

    #[test]
    fn test_prepare_rejects_wrong_opponent_reference() {
        let (a, _) = linked();
        let c = team("TEAM_C");
        let bank = NativeBank::new();

        let result = prepare_end_game(&a, &c, &bank, &addr("ADMIN"), &addr("TEAM_C"), Outcome::Lose);

        assert!(matches!(
            result,
            Err(SettlementError::Lifecycle(LifecycleError::OpponentMismatch { .. }))
        ));
    }

    #[test]
    fn test_peer_rejects_stranger() {
        let (_, mut b) = linked();
        let bank = NativeBank::new();

        let result = transfer_fund_and_end_game(&mut b, &bank, &addr("TEAM_C"), 0);

        assert!(matches!(
            result,
            Err(SettlementError::Authorization(AuthorizationError::NotOpponent { .. }))
        ));
        assert!(b.is_in_game());
    }

    #[test]
    fn test_apply_rejects_misdirected_request() {
        let (a, mut b) = linked();
        let bank = NativeBank::new();
        let mut request =
            prepare_end_game(&a, &b, &bank, &addr("ADMIN"), &addr("TEAM_B"), Outcome::Cancel).unwrap();
        request.to = addr("TEAM_C");

        let result = apply_settlement(&mut b, &bank, &request);

        assert!(matches!(result, Err(SettlementError::MisdirectedRequest { .. })));
        assert!(b.is_in_game());
    }

    #[test]
    fn test_phases_hand_off_request_id() {
        let (mut a, mut b) = linked();
        let bank = NativeBank::new();

        let request =
            prepare_end_game(&a, &b, &bank, &addr("ADMIN"), &addr("TEAM_B"), Outcome::Cancel).unwrap();
        let ack = apply_settlement(&mut b, &bank, &request).unwrap();
        let request_id = request.id;
        let receipt = finalize_end_game(&mut a, &bank, request, ack);

        assert_eq!(receipt.request_id, request_id);
        assert!(!a.is_in_game());
        assert!(!b.is_in_game());
        assert_eq!(receipt.initiator_price, None);
        assert_eq!(receipt.opponent_price, None);
    }
}
