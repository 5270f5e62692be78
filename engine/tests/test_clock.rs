//! Clock Tests
//!
//! The market clock is a UNIX timestamp in seconds that only moves forward.

use team_token_engine::{Clock, Market, MarketConfig};

fn create_test_market(start_time: u64) -> Market {
    let config = MarketConfig::from_json(&format!(
        r#"{{
            "start_time": {},
            "tokens": [{{ "address": "TEAM_A", "name": "A", "symbol": "A",
                          "administrator": "ADMIN", "fee_recipient": "TREASURY",
                          "initial_price": 10 }}]
        }}"#,
        start_time
    ))
    .unwrap();
    Market::new(config).unwrap()
}

// ============================================================================
// Clock
// ============================================================================

#[test]
fn test_clock_starts_at_given_time() {
    let clock = Clock::new(1_520_000_000);
    assert_eq!(clock.now(), 1_520_000_000);
}

#[test]
fn test_clock_advance_accumulates() {
    let mut clock = Clock::new(100);
    clock.advance(50);
    clock.advance(25);
    assert_eq!(clock.now(), 175);
}

#[test]
fn test_clock_advance_to_same_time_is_allowed() {
    let mut clock = Clock::new(100);
    clock.advance_to(100);
    assert_eq!(clock.now(), 100);
}

#[test]
#[should_panic(expected = "clock cannot move backwards")]
fn test_clock_advance_to_past_panics() {
    let mut clock = Clock::new(100);
    clock.advance_to(99);
}

// ============================================================================
// Market Clock
// ============================================================================

#[test]
fn test_market_clock_starts_at_config_start_time() {
    let market = create_test_market(1_520_000_000);
    assert_eq!(market.now(), 1_520_000_000);
}

#[test]
fn test_market_advance_time() {
    let mut market = create_test_market(1_520_000_000);

    market.advance_time(3_600);
    assert_eq!(market.now(), 1_520_003_600);

    market.advance_time_to(1_530_000_000);
    assert_eq!(market.now(), 1_530_000_000);
}
