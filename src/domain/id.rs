//! Domain identifier types with proper encapsulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical match identifier - newtype for type safety.
///
/// Derived deterministically from the participant display names (sorted,
/// `|`-joined), so polling the same match twice yields the same id even if
/// its position on the venue page changes. This makes the id portable across
/// venues but fragile to name-format drift (trailing qualifier tags, etc.);
/// see DESIGN.md.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(String);

impl MatchId {
    /// Create a `MatchId` from an already-derived id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the canonical id from participant display names.
    #[must_use]
    pub fn from_participants<S: AsRef<str>>(names: &[S]) -> Self {
        let mut names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
        names.sort_unstable();
        Self(names.join("|"))
    }

    /// Get the match ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Tracking identifier correlating one inbound bet request with its audit
/// artifacts. Generated as UUID v4 when the caller does not supply one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingId(String);

impl TrackingId {
    /// Create a new `TrackingId` with a generated UUID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the tracking ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TrackingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TrackingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TrackingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Abstract market tier requested by a caller (e.g. the top tour vs. its
/// qualifying tier). Each driver maps a kind to its own concrete sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketKind(String);

impl MarketKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Get the kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MarketKind {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for MarketKind {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A provider-specific concrete navigable category that a kind maps to.
///
/// Ordering of a driver's declared sections defines fallback priority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Section(String);

impl Section {
    pub fn new(section: impl Into<String>) -> Self {
        Self(section.into())
    }

    /// Get the section as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Section {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for Section {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_id_is_order_independent() {
        let a = MatchId::from_participants(&["B", "A"]);
        let b = MatchId::from_participants(&["A", "B"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "A|B");
    }

    #[test]
    fn match_id_same_match_polled_twice() {
        let first = MatchId::from_participants(&["Nadal, R.", "Federer, R."]);
        let second = MatchId::from_participants(&["Federer, R.", "Nadal, R."]);
        assert_eq!(first, second);
    }

    #[test]
    fn tracking_id_generates_unique_ids() {
        let id1 = TrackingId::new();
        let id2 = TrackingId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn tracking_id_from_existing_string() {
        let id = TrackingId::from("bet-42");
        assert_eq!(id.as_str(), "bet-42");
    }

    #[test]
    fn section_display() {
        let s = Section::new("atp_qual");
        assert_eq!(format!("{}", s), "atp_qual");
    }
}
