//! A scripted [`ProviderDriver`] with per-section behavior and call
//! recording, for aggregator and fallback tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::{clamp_stake, BetRequest, BetType, MarketKind, RawMatchInfo, Section};
use crate::error::{ProviderError, Result};
use crate::provider::ProviderDriver;

/// Scripted driver. Configure per-section behavior with the builder
/// methods, then inspect `calls()` for the exact operation order.
#[derive(Default)]
pub struct ScriptedDriver {
    sections: HashMap<String, Vec<Section>>,
    extractions: HashMap<String, Vec<RawMatchInfo>>,
    /// Sections where `navigate_to_section` reports "does not exist".
    missing_sections: HashSet<String>,
    /// Sections where `await_market_ready` times out (no offerings).
    unready_sections: HashSet<String>,
    /// Sections where extraction fails outright.
    failing_sections: HashSet<String>,
    /// Sections that accept a stake.
    accepting_sections: HashSet<String>,
    /// Sections where the stake flow errors mid-way.
    stake_error_sections: HashSet<String>,
    venue_max: Option<Decimal>,
    bankroll: Decimal,
    auth_failure: Option<String>,
    current_section: Mutex<Option<Section>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self {
            bankroll: dec!(100),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sections(mut self, kind: &str, sections: &[&str]) -> Self {
        self.sections.insert(
            kind.to_string(),
            sections.iter().copied().map(Section::from).collect(),
        );
        self
    }

    #[must_use]
    pub fn with_extraction(mut self, section: &str, raws: Vec<RawMatchInfo>) -> Self {
        self.extractions.insert(section.to_string(), raws);
        self
    }

    #[must_use]
    pub fn with_missing_section(mut self, section: &str) -> Self {
        self.missing_sections.insert(section.to_string());
        self
    }

    #[must_use]
    pub fn with_unready_section(mut self, section: &str) -> Self {
        self.unready_sections.insert(section.to_string());
        self
    }

    #[must_use]
    pub fn with_failing_section(mut self, section: &str) -> Self {
        self.failing_sections.insert(section.to_string());
        self
    }

    #[must_use]
    pub fn with_accepting_section(mut self, section: &str) -> Self {
        self.accepting_sections.insert(section.to_string());
        self
    }

    #[must_use]
    pub fn with_stake_error_section(mut self, section: &str) -> Self {
        self.stake_error_sections.insert(section.to_string());
        self
    }

    /// Venue-displayed maximum stake for accepting sections.
    #[must_use]
    pub fn with_venue_max(mut self, max: Decimal) -> Self {
        self.venue_max = Some(max);
        self
    }

    #[must_use]
    pub fn with_bankroll(mut self, bankroll: Decimal) -> Self {
        self.bankroll = bankroll;
        self
    }

    #[must_use]
    pub fn with_auth_failure(mut self, reason: &str) -> Self {
        self.auth_failure = Some(reason.to_string());
        self
    }

    /// Recorded operations, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }
}

/// Build a raw extraction entry for tests.
pub fn raw_match(participants: &[(&str, &str)]) -> RawMatchInfo {
    let mut names: Vec<&str> = participants.iter().map(|(name, _)| *name).collect();
    names.sort_unstable();
    RawMatchInfo {
        id: names.join("|"),
        outright_odds: participants
            .iter()
            .map(|(name, odds)| (name.to_string(), odds.to_string()))
            .collect(),
        spread_odds: Default::default(),
        participant_index: participants
            .iter()
            .enumerate()
            .map(|(index, (name, _))| (name.to_string(), index))
            .collect(),
    }
}

#[async_trait]
impl ProviderDriver for ScriptedDriver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn login_url(&self) -> &str {
        "https://scripted.invalid/login"
    }

    async fn handle_auth(&self) -> Result<()> {
        self.record("handle_auth");
        if let Some(reason) = &self.auth_failure {
            return Err(ProviderError::Authentication {
                provider: "scripted",
                reason: reason.clone(),
            }
            .into());
        }
        Ok(())
    }

    async fn await_auth_done(&self) -> Result<()> {
        self.record("await_auth_done");
        Ok(())
    }

    async fn sections_for_kind(&self, kind: &MarketKind) -> Result<Vec<Section>> {
        Ok(self.sections.get(kind.as_str()).cloned().unwrap_or_default())
    }

    async fn navigate_to_section(&self, section: &Section) -> Result<bool> {
        self.record(format!("navigate:{section}"));
        if self.missing_sections.contains(section.as_str()) {
            return Ok(false);
        }
        *self.current_section.lock() = Some(section.clone());
        Ok(true)
    }

    async fn await_market_ready(&self, section: &Section) -> Result<()> {
        self.record(format!("ready:{section}"));
        if self.unready_sections.contains(section.as_str()) {
            return Err(ProviderError::SectionUnavailable {
                section: section.to_string(),
                reason: "no offerings".into(),
            }
            .into());
        }
        Ok(())
    }

    async fn extract_raw_matches(&self) -> Result<Vec<RawMatchInfo>> {
        let section = self.current_section.lock().clone().ok_or_else(|| {
            ProviderError::ExtractionMismatch("extraction before navigation".into())
        })?;
        self.record(format!("extract:{section}"));
        if self.failing_sections.contains(section.as_str()) {
            return Err(ProviderError::TransientUi("markup changed underneath us".into()).into());
        }
        Ok(self
            .extractions
            .get(section.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn bankroll(&self) -> Result<Decimal> {
        self.record("bankroll");
        Ok(self.bankroll)
    }

    async fn place_stake(
        &self,
        section: &Section,
        _bet_type: BetType,
        request: &BetRequest,
    ) -> Result<Decimal> {
        self.record(format!("stake:{section}"));
        if self.stake_error_sections.contains(section.as_str()) {
            return Err(ProviderError::StakeRead("limit label never populated".into()).into());
        }
        if !self.accepting_sections.contains(section.as_str()) {
            return Ok(Decimal::ZERO);
        }
        let venue_max = self.venue_max.unwrap_or(request.stake);
        Ok(clamp_stake(request.stake, venue_max))
    }
}
