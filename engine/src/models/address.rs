//! Account identities
//!
//! Every participant in the market (token instances, administrators, fee
//! recipients, holders) is identified by an opaque `Address`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque account identifier (e.g. "TEAM_BRA", "ALICE")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address from any string-like identifier
    ///
    /// # Example
    /// ```
    /// use team_token_engine::Address;
    ///
    /// let addr = Address::new("TEAM_BRA");
    /// assert_eq!(addr.as_str(), "TEAM_BRA");
    /// ```
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty identifier, which is never a valid account
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Address {
    fn from(id: String) -> Self {
        Self(id)
    }
}
