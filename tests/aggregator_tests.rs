//! End-to-end aggregator behavior against a scripted driver: section
//! fallback order, stake clamping, partial snapshots, and the
//! no-matching-offering condition.

use rust_decimal_macros::dec;

use oddsgate::aggregator::MatchAggregator;
use oddsgate::domain::{BetRequest, BetType, MarketKind, MatchId, TrackingId};
use oddsgate::error::{Error, ProviderError};
use oddsgate::testkit::driver::{raw_match, ScriptedDriver};

fn bet(kind: &str, match_id: &str, participant: &str, stake: rust_decimal::Decimal) -> BetRequest {
    BetRequest {
        kind: MarketKind::new(kind),
        bet_type: BetType::Outright,
        tracking_id: TrackingId::from("t-test"),
        match_id: MatchId::new(match_id),
        participant: participant.to_string(),
        stake,
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn snapshot_normalizes_across_sections() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["main", "qualifiers"])
        .with_extraction("main", vec![raw_match(&[("A", "-150"), ("B", "+130")])])
        .with_extraction("qualifiers", vec![raw_match(&[("C", "2.4"), ("D", "1.55")])])
        .with_bankroll(dec!(812.50));

    let snapshot = MatchAggregator::market_snapshot(&driver, &MarketKind::new("top"))
        .await
        .unwrap();

    assert_eq!(snapshot.matches.len(), 2);
    let main = &snapshot.matches[0];
    assert_eq!(main.id.as_str(), "A|B");
    assert_eq!(main.outright_odds["A"].round_dp(3), dec!(1.667));
    assert_eq!(main.outright_odds["B"], dec!(2.3));
    // Unsigned strings are already decimal and pass through unchanged.
    let quals = &snapshot.matches[1];
    assert_eq!(quals.outright_odds["C"], dec!(2.4));

    // Bankroll is captured at flow end.
    assert_eq!(snapshot.bankroll, dec!(812.50));
    let calls = driver.calls();
    assert_eq!(calls.last().unwrap(), "bankroll");
}

#[tokio::test]
async fn snapshot_walks_sections_in_declared_order() {
    let driver = ScriptedDriver::new().with_sections("top", &["main", "qualifiers"]);

    MatchAggregator::market_snapshot(&driver, &MarketKind::new("top"))
        .await
        .unwrap();

    assert_eq!(
        driver.calls(),
        vec![
            "handle_auth",
            "await_auth_done",
            "navigate:main",
            "ready:main",
            "extract:main",
            "navigate:qualifiers",
            "ready:qualifiers",
            "extract:qualifiers",
            "bankroll",
        ]
    );
}

#[tokio::test]
async fn snapshot_tolerates_missing_and_unready_sections() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["gone", "quiet", "main"])
        .with_missing_section("gone")
        .with_unready_section("quiet")
        .with_extraction("main", vec![raw_match(&[("A", "-150"), ("B", "+130")])]);

    let snapshot = MatchAggregator::market_snapshot(&driver, &MarketKind::new("top"))
        .await
        .unwrap();

    assert_eq!(snapshot.matches.len(), 1);
    assert_eq!(snapshot.matches[0].id.as_str(), "A|B");
}

#[tokio::test]
async fn snapshot_is_partial_when_one_section_errors() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["broken", "main"])
        .with_failing_section("broken")
        .with_extraction("main", vec![raw_match(&[("A", "-150"), ("B", "+130")])]);

    let snapshot = MatchAggregator::market_snapshot(&driver, &MarketKind::new("top"))
        .await
        .unwrap();

    assert_eq!(snapshot.matches.len(), 1, "other sections still contribute");
}

#[tokio::test]
async fn snapshot_drops_malformed_entries_not_the_section() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["main"])
        .with_extraction(
            "main",
            vec![
                raw_match(&[("A", "-150"), ("B", "+130")]),
                raw_match(&[("C", "soon"), ("D", "+110")]),
            ],
        );

    let snapshot = MatchAggregator::market_snapshot(&driver, &MarketKind::new("top"))
        .await
        .unwrap();

    assert_eq!(snapshot.matches.len(), 1);
    assert_eq!(snapshot.matches[0].id.as_str(), "A|B");
}

#[tokio::test]
async fn snapshot_aborts_on_authentication_failure() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["main"])
        .with_auth_failure("venue rejected credentials");

    let result = MatchAggregator::market_snapshot(&driver, &MarketKind::new("top")).await;
    assert!(matches!(
        result,
        Err(Error::Provider(ProviderError::Authentication { .. }))
    ));
}

// ---------------------------------------------------------------------------
// Bet placement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bet_stops_at_first_accepting_section() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["main", "qualifiers", "challenger"])
        .with_accepting_section("qualifiers");

    let outcome = MatchAggregator::place_bet(&driver, &bet("top", "A|B", "A", dec!(50)))
        .await
        .unwrap();

    assert_eq!(outcome.committed_stake, dec!(50));
    assert_eq!(outcome.section.as_str(), "qualifiers");
    assert_eq!(
        driver.calls(),
        vec![
            "handle_auth",
            "await_auth_done",
            "stake:main",
            "stake:qualifiers",
        ],
        "challenger must never be tried"
    );
}

#[tokio::test]
async fn bet_clamps_to_venue_max() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["main"])
        .with_accepting_section("main")
        .with_venue_max(dec!(200));

    let outcome = MatchAggregator::place_bet(&driver, &bet("top", "A|B", "A", dec!(500)))
        .await
        .unwrap();

    assert_eq!(outcome.committed_stake, dec!(200));
}

#[tokio::test]
async fn bet_fails_with_no_matching_offering_when_all_zero() {
    let driver = ScriptedDriver::new().with_sections("top", &["main", "qualifiers"]);

    let result = MatchAggregator::place_bet(&driver, &bet("top", "A|B", "A", dec!(50))).await;

    assert!(matches!(
        result,
        Err(Error::Provider(ProviderError::NoMatchingOffering { .. }))
    ));
}

#[tokio::test]
async fn bet_falls_through_stake_errors_to_next_section() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["main", "qualifiers"])
        .with_stake_error_section("main")
        .with_accepting_section("qualifiers");

    let outcome = MatchAggregator::place_bet(&driver, &bet("top", "A|B", "A", dec!(50)))
        .await
        .unwrap();

    assert_eq!(outcome.section.as_str(), "qualifiers");
}

#[tokio::test]
async fn bet_aborts_on_authentication_failure() {
    let driver = ScriptedDriver::new()
        .with_sections("top", &["main"])
        .with_accepting_section("main")
        .with_auth_failure("venue rejected credentials");

    let result = MatchAggregator::place_bet(&driver, &bet("top", "A|B", "A", dec!(50))).await;
    assert!(matches!(
        result,
        Err(Error::Provider(ProviderError::Authentication { .. }))
    ));
    assert_eq!(driver.calls(), vec!["handle_auth"], "no section may be tried");
}
