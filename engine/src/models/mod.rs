//! Domain models for the team token market

pub mod address;
pub mod bank;
pub mod event;
pub mod ledger;
pub mod token;

// Re-exports
pub use address::Address;
pub use bank::{CurrencyTransport, NativeBank, TransportError};
pub use event::{Event, EventLog};
pub use ledger::{BalanceLedger, Ledger, LedgerError};
pub use token::{AuthorizationError, Token, TokenConfig};
