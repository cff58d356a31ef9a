//! Match market types: provider-native extraction results and their
//! canonical, normalized form.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::id::MatchId;
use crate::domain::odds::{convert_american_odds, convert_handicap_fraction};
use crate::error::OddsError;

/// Provider-native extraction result for one match, produced per extraction
/// call by in-page JavaScript (hence `Deserialize` with camelCase keys).
///
/// Odds values are venue-native strings; nothing here is normalized.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatchInfo {
    pub id: String,
    /// Participant display name -> venue-native outright odds string.
    pub outright_odds: HashMap<String, String>,
    /// Participant display name -> (price string, handicap line string).
    #[serde(default)]
    pub spread_odds: HashMap<String, (String, String)>,
    /// Participant display name -> position on the venue page (0 or 1).
    #[serde(default)]
    pub participant_index: HashMap<String, usize>,
}

/// A normalized spread/handicap quote: price tied to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpreadQuote {
    /// Canonical decimal price.
    pub price: Decimal,
    /// Handicap line (may be negative or half-point).
    pub line: Decimal,
}

/// Canonical form of [`RawMatchInfo`]: numeric decimal odds throughout.
///
/// Consumed by the caller; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct MatchInfo {
    pub id: MatchId,
    /// Participant display name -> canonical decimal outright odds.
    pub outright_odds: BTreeMap<String, Decimal>,
    /// Participant display name -> normalized spread quote.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub spread_odds: BTreeMap<String, SpreadQuote>,
}

impl MatchInfo {
    /// Normalize one raw extraction result.
    ///
    /// Any malformed odds value fails the whole entry; partial matches would
    /// misrepresent the market.
    pub fn from_raw(raw: &RawMatchInfo) -> Result<Self, OddsError> {
        let mut outright_odds = BTreeMap::new();
        for (participant, odds) in &raw.outright_odds {
            outright_odds.insert(participant.clone(), convert_american_odds(odds)?);
        }

        let mut spread_odds = BTreeMap::new();
        for (participant, (price, line)) in &raw.spread_odds {
            spread_odds.insert(
                participant.clone(),
                SpreadQuote {
                    price: convert_american_odds(price)?,
                    line: convert_handicap_fraction(line)?,
                },
            );
        }

        Ok(Self {
            id: MatchId::new(raw.id.clone()),
            outright_odds,
            spread_odds,
        })
    }
}

/// Normalize a batch of raw extraction results.
///
/// Entries that fail to normalize are dropped with a warning (extraction
/// mismatch) and the rest are kept; one bad entry never poisons a section.
pub fn normalize_all(raws: &[RawMatchInfo]) -> Vec<MatchInfo> {
    raws.iter()
        .filter_map(|raw| match MatchInfo::from_raw(raw) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(match_id = %raw.id, error = %e, "Dropping entry with malformed odds");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(id: &str, odds: &[(&str, &str)]) -> RawMatchInfo {
        RawMatchInfo {
            id: id.to_string(),
            outright_odds: odds
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            spread_odds: HashMap::new(),
            participant_index: odds
                .iter()
                .enumerate()
                .map(|(i, (k, _))| (k.to_string(), i))
                .collect(),
        }
    }

    #[test]
    fn normalizes_outright_odds() {
        let info = MatchInfo::from_raw(&raw("A|B", &[("A", "-150"), ("B", "+130")])).unwrap();
        assert_eq!(info.outright_odds["A"].round_dp(3), dec!(1.667));
        assert_eq!(info.outright_odds["B"], dec!(2.3));
    }

    #[test]
    fn normalizes_spread_odds() {
        let mut r = raw("A|B", &[("A", "-110"), ("B", "-110")]);
        r.spread_odds.insert(
            "A".to_string(),
            ("-105".to_string(), "-1\u{00BD}".to_string()),
        );
        r.spread_odds
            .insert("B".to_string(), ("-115".to_string(), "1\u{00BD}".to_string()));

        let info = MatchInfo::from_raw(&r).unwrap();
        assert_eq!(info.spread_odds["A"].line, dec!(-1.5));
        assert_eq!(info.spread_odds["B"].line, dec!(1.5));
    }

    #[test]
    fn malformed_entry_is_fatal_for_that_entry() {
        assert!(MatchInfo::from_raw(&raw("A|B", &[("A", "n/a"), ("B", "+130")])).is_err());
    }

    #[test]
    fn normalize_all_drops_only_bad_entries() {
        let raws = vec![
            raw("A|B", &[("A", "-150"), ("B", "+130")]),
            raw("C|D", &[("C", "bogus"), ("D", "+120")]),
            raw("E|F", &[("E", "2.05"), ("F", "1.8")]),
        ];
        let infos = normalize_all(&raws);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].id.as_str(), "A|B");
        assert_eq!(infos[1].id.as_str(), "E|F");
        // unsigned strings are already decimal and pass through
        assert_eq!(infos[1].outright_odds["E"], dec!(2.05));
    }
}
