//! Settlement Module
//!
//! Ends a game between two linked tokens and moves the wagered reserve.
//!
//! # Two-Phase Protocol
//!
//! ```text
//! initiator (admin calls end_game)             peer
//! ────────────────────────────────             ────
//! 1. prepare: authorize, plan → SettlementRequest
//! 2. send fee → fee_recipient
//! 3. send value ─────────────────────────────→ 4. apply: authorize caller,
//!                                                 reprice, reset → SettlementAck
//! 5. finalize: reset, reprice ←─────────────────
//! ```
//!
//! Steps run in this order with no yield point in between. The protocol is
//! not atomic across the two tokens by itself: the market wraps the whole
//! sequence in one all-or-nothing operation.
//!
//! # Critical Invariants
//!
//! 1. **Single Initiator**: only the losing side (or, for a draw, the side
//!    with the larger reserve) settles; `Win` is never self-reported
//! 2. **Conservation**: `fee + value <= initiator reserve`
//! 3. **Peer Authorization**: the peer only accepts a request from its
//!    registered opponent

pub mod plan;
pub mod protocol;

// Re-export public API
pub use plan::{plan_settlement, Outcome, ReserveView, SettlementPlan};
pub use protocol::{
    apply_settlement, end_game, finalize_end_game, prepare_end_game, transfer_fund_and_end_game,
    SettlementAck, SettlementError, SettlementReceipt, SettlementRequest,
};
