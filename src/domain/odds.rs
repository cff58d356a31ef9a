//! Pure conversion functions: venue-native odds/stake strings to canonical
//! numeric forms.
//!
//! All three functions are pure and total over well-formed input. Malformed
//! input yields an [`OddsError`] that must propagate as a fatal per-entry
//! error - never silently coerced to zero, since zero would misrepresent a
//! real odds value.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::OddsError;

/// Half-point glyph used by venues for fractional handicap lines.
const HALF_GLYPH: char = '\u{00BD}';

/// Currency symbols accepted as a single leading prefix of money strings.
const CURRENCY_SYMBOLS: [char; 3] = ['$', '\u{20AC}', '\u{00A3}'];

/// Convert an American-style odds string (e.g. `+110`, `-110`) to canonical
/// decimal odds (e.g. `2.1`, `1.909...`).
///
/// A string with no explicit sign prefix is already a decimal price and
/// passes through unchanged.
pub fn convert_american_odds(odds: &str) -> Result<Decimal, OddsError> {
    let odds = odds.trim();
    let invalid = || OddsError::InvalidOdds(odds.to_string());

    if let Some(rest) = odds.strip_prefix('-') {
        let n: Decimal = rest.parse().map_err(|_| invalid())?;
        if n.is_zero() {
            return Err(invalid());
        }
        Ok((n + dec!(100)) / n)
    } else if let Some(rest) = odds.strip_prefix('+') {
        let n: Decimal = rest.parse().map_err(|_| invalid())?;
        Ok((n + dec!(100)) / dec!(100))
    } else {
        odds.parse().map_err(|_| invalid())
    }
}

/// Convert a handicap line that may carry a trailing half-point glyph.
///
/// The glyph adds 0.5 in the same sign direction as the integer part:
/// `"-1½"` is -1.5 and `"1½"` is 1.5. Without the glyph the string is parsed
/// as a plain decimal.
pub fn convert_handicap_fraction(line: &str) -> Result<Decimal, OddsError> {
    let line = line.trim();
    let invalid = || OddsError::InvalidHandicap(line.to_string());

    match line.strip_suffix(HALF_GLYPH) {
        Some(base) => {
            let negative = base.starts_with('-');
            let magnitude: Decimal = match base.trim_start_matches(['-', '+']) {
                "" => Decimal::ZERO,
                digits => digits.parse().map_err(|_| invalid())?,
            };
            let value = magnitude + dec!(0.5);
            Ok(if negative { -value } else { value })
        }
        None => line.parse().map_err(|_| invalid()),
    }
}

/// Parse a venue-displayed money string into a decimal amount.
///
/// Tolerates surrounding whitespace, a single leading currency symbol, and
/// thousands separators: `" $1,234.50 "` parses to `1234.5`.
pub fn parse_money_string(money: &str) -> Result<Decimal, OddsError> {
    let trimmed = money.trim();
    let stripped = trimmed
        .strip_prefix(&CURRENCY_SYMBOLS[..])
        .unwrap_or(trimmed)
        .trim_start();
    let normalized: String = stripped.chars().filter(|c| *c != ',').collect();

    normalized
        .parse()
        .map_err(|_| OddsError::InvalidMoney(money.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn american_positive() {
        assert_eq!(convert_american_odds("+110").unwrap(), dec!(2.1));
    }

    #[test]
    fn american_negative() {
        let odds = convert_american_odds("-110").unwrap();
        assert_eq!(odds.round_dp(4), dec!(1.9091));

        assert_eq!(convert_american_odds("-200").unwrap(), dec!(1.5));
    }

    #[test]
    fn unsigned_passes_through() {
        assert_eq!(convert_american_odds("150").unwrap(), dec!(150.0));
        assert_eq!(convert_american_odds("1.85").unwrap(), dec!(1.85));
    }

    #[test]
    fn malformed_odds_rejected() {
        assert!(convert_american_odds("evens").is_err());
        assert!(convert_american_odds("+").is_err());
        assert!(convert_american_odds("-0").is_err());
        assert!(convert_american_odds("").is_err());
    }

    #[test]
    fn handicap_half_points() {
        assert_eq!(convert_handicap_fraction("-1\u{00BD}").unwrap(), dec!(-1.5));
        assert_eq!(convert_handicap_fraction("1\u{00BD}").unwrap(), dec!(1.5));
        assert_eq!(convert_handicap_fraction("0\u{00BD}").unwrap(), dec!(0.5));
    }

    #[test]
    fn handicap_plain_decimal() {
        assert_eq!(convert_handicap_fraction("-3").unwrap(), dec!(-3.0));
        assert_eq!(convert_handicap_fraction("2.5").unwrap(), dec!(2.5));
    }

    #[test]
    fn malformed_handicap_rejected() {
        assert!(convert_handicap_fraction("pk").is_err());
    }

    #[test]
    fn money_with_symbol_and_separators() {
        assert_eq!(parse_money_string("$1,234.50").unwrap(), dec!(1234.5));
        assert_eq!(parse_money_string(" $0.00 ").unwrap(), dec!(0.0));
    }

    #[test]
    fn money_without_symbol() {
        assert_eq!(parse_money_string("987.25").unwrap(), dec!(987.25));
    }

    #[test]
    fn malformed_money_rejected() {
        assert!(parse_money_string("").is_err());
        assert!(parse_money_string("$").is_err());
        assert!(parse_money_string("N/A").is_err());
    }
}
