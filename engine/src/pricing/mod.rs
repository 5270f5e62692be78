//! Price oracle
//!
//! After a settlement the unit price of a token is re-derived from what backs
//! it: `unit_price = reserve / total_supply` (floor). Between settlements
//! trading never moves the price.

use crate::models::ledger::BalanceLedger;
use crate::models::token::Token;

/// Price implied by `reserve` over `supply`, or `None` when there is no supply
///
/// # Example
/// ```
/// use team_token_engine::pricing::implied_price;
///
/// assert_eq!(implied_price(1_095, 10), Some(109));
/// assert_eq!(implied_price(1_095, 0), None);
/// ```
pub fn implied_price(reserve: u128, supply: u128) -> Option<u128> {
    reserve.checked_div(supply)
}

/// Recompute `token`'s unit price from `reserve`
///
/// Leaves the price untouched when the token has no supply. Returns the new
/// price if one was set.
pub fn reprice<L: BalanceLedger>(token: &mut Token<L>, reserve: u128) -> Option<u128> {
    let price = implied_price(reserve, token.total_supply())?;
    token.set_unit_price(price);
    Some(price)
}
