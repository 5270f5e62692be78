//! Notification log for auditing and replay.
//!
//! Every observable side effect of a market operation is recorded as an
//! [`Event`]. Events are one-way: nothing in the engine reads them back to
//! make decisions. When an operation is rolled back, the events it emitted are
//! discarded with it.
//!
//! # Example
//!
//! ```rust
//! use team_token_engine::{Address, Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::Buy {
//!     token: Address::new("TEAM_BRA"),
//!     from: Address::new("ALICE"),
//!     token_amount: 10,
//!     currency_amount: 10_000,
//! });
//!
//! assert_eq!(log.events_of_type("Buy").len(), 1);
//! ```

use crate::lifecycle::TradingStatus;
use crate::models::address::Address;
use crate::settlement::Outcome;
use serde::{Deserialize, Serialize};

/// Market event capturing a state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Currency converted into tokens
    Buy {
        token: Address,
        from: Address,
        token_amount: u128,
        currency_amount: u128,
    },

    /// Tokens converted back into currency
    Sell {
        token: Address,
        from: Address,
        token_amount: u128,
        currency_amount: u128,
    },

    /// Plain ledger transfer between holders
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        amount: u128,
    },

    /// Administrator linked `team1` to `team2` for a game
    BeginGame {
        team1: Address,
        team2: Address,
        start_time: Option<u64>,
    },

    /// Settlement completed, emitted by the initiating side only
    EndGame {
        team1: Address,
        team2: Address,
        outcome: Outcome,
    },

    /// Administrator changed the stored trading status
    ChangeStatus { team: Address, status: TradingStatus },

    /// Reserve swept to the fee recipient after the deadline
    Finish {
        token: Address,
        recipient: Address,
        amount: u128,
    },
}

impl Event {
    /// Short name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::Buy { .. } => "Buy",
            Event::Sell { .. } => "Sell",
            Event::Transfer { .. } => "Transfer",
            Event::BeginGame { .. } => "BeginGame",
            Event::EndGame { .. } => "EndGame",
            Event::ChangeStatus { .. } => "ChangeStatus",
            Event::Finish { .. } => "Finish",
        }
    }

    /// Token instance the event was emitted by
    pub fn token(&self) -> &Address {
        match self {
            Event::Buy { token, .. } => token,
            Event::Sell { token, .. } => token,
            Event::Transfer { token, .. } => token,
            Event::BeginGame { team1, .. } => team1,
            Event::EndGame { team1, .. } => team1,
            Event::ChangeStatus { team, .. } => team,
            Event::Finish { token, .. } => token,
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events emitted by a specific token instance
    pub fn events_for_token(&self, token: &Address) -> Vec<&Event> {
        self.events.iter().filter(|e| e.token() == token).collect()
    }

    /// Drop every event after the first `len` (rollback)
    pub fn truncate(&mut self, len: usize) {
        self.events.truncate(len);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buy(token: &str, from: &str) -> Event {
        Event::Buy {
            token: Address::new(token),
            from: Address::new(from),
            token_amount: 1,
            currency_amount: 1_000,
        }
    }

    #[test]
    fn test_event_type() {
        let event = Event::EndGame {
            team1: Address::new("TEAM_A"),
            team2: Address::new("TEAM_B"),
            outcome: Outcome::Draw,
        };

        assert_eq!(event.event_type(), "EndGame");
        assert_eq!(event.token(), &Address::new("TEAM_A"));
    }

    #[test]
    fn test_event_log_query_by_token() {
        let mut log = EventLog::new();
        log.log(buy("TEAM_A", "ALICE"));
        log.log(buy("TEAM_B", "ALICE"));
        log.log(Event::ChangeStatus {
            team: Address::new("TEAM_A"),
            status: TradingStatus::Frozen,
        });

        assert_eq!(log.events_for_token(&Address::new("TEAM_A")).len(), 2);
        assert_eq!(log.events_for_token(&Address::new("TEAM_B")).len(), 1);
    }

    #[test]
    fn test_event_log_truncate() {
        let mut log = EventLog::new();
        log.log(buy("TEAM_A", "ALICE"));
        log.log(buy("TEAM_A", "BOB"));
        log.log(buy("TEAM_A", "CAROL"));

        log.truncate(1);

        assert_eq!(log.len(), 1);
        assert_eq!(log.last(), Some(&buy("TEAM_A", "ALICE")));
    }
}
