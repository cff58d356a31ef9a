//! Bet request/outcome types and the stake clamping rule.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::id::{MarketKind, MatchId, Section, TrackingId};
use crate::domain::market::MatchInfo;

/// Which market a stake targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    /// Price on the outright winner.
    Outright,
    /// Price tied to a handicap line.
    Spread,
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetType::Outright => write!(f, "outright"),
            BetType::Spread => write!(f, "spread"),
        }
    }
}

impl FromStr for BetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outright" => Ok(BetType::Outright),
            "spread" => Ok(BetType::Spread),
            other => Err(format!("unknown bet type '{other}' (expected 'outright' or 'spread')")),
        }
    }
}

/// One logical wager request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRequest {
    pub kind: MarketKind,
    pub bet_type: BetType,
    pub tracking_id: TrackingId,
    pub match_id: MatchId,
    /// Participant display name identifying the outcome to back.
    pub participant: String,
    /// Requested stake; may be clamped down to the venue-displayed maximum.
    pub stake: Decimal,
}

/// Result of a committed wager.
///
/// The committed stake is authoritative: it is the venue-clamped amount that
/// was actually entered, which may be less than requested. Callers who care
/// about partial fulfillment diff requested vs. committed themselves.
#[derive(Debug, Clone, Serialize)]
pub struct BetOutcome {
    pub committed_stake: Decimal,
    /// Section that accepted the stake.
    pub section: Section,
}

/// One normalized market snapshot across a driver's sections for a kind.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    pub matches: Vec<MatchInfo>,
    pub bankroll: Decimal,
}

/// Clamp a requested stake to the venue-displayed maximum.
///
/// The clamp is silent: the reduced amount is returned as the committed
/// stake with no distinct "partially fulfilled" signal.
#[must_use]
pub fn clamp_stake(requested: Decimal, venue_max: Decimal) -> Decimal {
    requested.min(venue_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn clamps_to_venue_max() {
        assert_eq!(clamp_stake(dec!(500), dec!(200)), dec!(200));
    }

    #[test]
    fn requested_below_max_is_untouched() {
        assert_eq!(clamp_stake(dec!(50), dec!(200)), dec!(50));
        assert_eq!(clamp_stake(dec!(200), dec!(200)), dec!(200));
    }

    #[test]
    fn bet_type_round_trips_from_str() {
        assert_eq!("outright".parse::<BetType>().unwrap(), BetType::Outright);
        assert_eq!("spread".parse::<BetType>().unwrap(), BetType::Spread);
        assert!("parlay".parse::<BetType>().is_err());
    }
}
