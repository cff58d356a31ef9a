//! Venue-agnostic types: identifiers, odds conversion, markets, bets.

pub mod bet;
pub mod id;
pub mod market;
pub mod odds;

pub use bet::{clamp_stake, BetOutcome, BetRequest, BetType, MarketSnapshot};
pub use id::{MarketKind, MatchId, Section, TrackingId};
pub use market::{normalize_all, MatchInfo, RawMatchInfo, SpreadQuote};
