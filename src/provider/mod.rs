//! The provider-agnostic driver protocol and its venue implementations.
//!
//! Every venue implements [`ProviderDriver`]: authentication, section
//! enumeration, extraction, and staking behind one uniform contract. A
//! driver instance is constructed bound to the page it operates on, so the
//! protocol methods carry no page parameter and scripted implementations
//! need no browser at all.
//!
//! Venue selection is tagged dispatch through [`DriverRegistry`]: a
//! name-to-constructor table. A venue without a registry entry is a lookup
//! error, never a runtime stub.

pub mod bookline;
pub mod credentials;
pub mod pickspot;
pub mod retry;
pub mod wagerhall;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::artifact::ArtifactStore;
use crate::browser::PageHandle;
use crate::domain::{BetRequest, BetType, MarketKind, MatchId, RawMatchInfo, Section};
use crate::error::{Error, ProviderError, Result};

pub use credentials::{CredentialStore, Credentials, JsonFileCredentials};

/// Everything a driver needs besides its page.
#[derive(Clone)]
pub struct ProviderContext {
    pub credentials: Credentials,
    pub artifacts: Arc<dyn ArtifactStore>,
    /// Non-committing mode: run the full stake flow but never click the
    /// final commit control.
    pub dry_run: bool,
}

/// The capability set every venue must implement.
///
/// One logical operation walks: authenticate, then for each declared section
/// in order: navigate, await readiness, extract or stake. Section-scoped
/// failures (see [`ProviderError`]) never abort the whole operation.
#[async_trait]
pub trait ProviderDriver: Send + Sync {
    /// Venue name as registered; used for logging and artifact keys.
    fn name(&self) -> &'static str;

    /// Entry point URL of the venue's login flow.
    fn login_url(&self) -> &str;

    /// Load the login page and perform the venue's login if it asks for
    /// one. Venues that keep a session alive may find themselves already
    /// authenticated and skip the form.
    async fn handle_auth(&self) -> Result<()>;

    /// Resolve once the post-login page is stable, independent of how many
    /// redirects the login triggered.
    async fn await_auth_done(&self) -> Result<()>;

    /// Full authentication flow.
    async fn authenticate(&self) -> Result<()> {
        self.handle_auth().await?;
        self.await_auth_done().await
    }

    /// Ordered list of this venue's concrete sections for an abstract kind.
    /// Ordering defines fallback priority. May be static or queried live.
    async fn sections_for_kind(&self, kind: &MarketKind) -> Result<Vec<Section>>;

    /// Navigate to a section. `false` means the section does not currently
    /// exist on the venue; that is not an error.
    async fn navigate_to_section(&self, section: &Section) -> Result<bool>;

    /// Block until extractable content is present, bounded. A timeout is
    /// reported as [`ProviderError::SectionUnavailable`]: the section has no
    /// offerings right now.
    async fn await_market_ready(&self, section: &Section) -> Result<()>;

    /// Pull every match offered on the current page, venue-native.
    async fn extract_raw_matches(&self) -> Result<Vec<RawMatchInfo>>;

    /// Funds available, plus any separately tracked pending exposure, summed.
    async fn bankroll(&self) -> Result<Decimal>;

    /// Attempt to commit the requested stake in one section. Returns the
    /// actually-committed (clamped) amount; zero means the wager is not
    /// available in this section, distinct from an error.
    async fn place_stake(
        &self,
        section: &Section,
        bet_type: BetType,
        request: &BetRequest,
    ) -> Result<Decimal>;
}

/// Constructor for a driver bound to a page.
pub type DriverFactory = fn(PageHandle, ProviderContext) -> Box<dyn ProviderDriver>;

/// Name-to-constructor registry for venue drivers.
#[derive(Default)]
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with every built-in venue.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(bookline::NAME, bookline::BooklineDriver::boxed);
        registry.register(wagerhall::NAME, wagerhall::WagerhallDriver::boxed);
        registry.register(pickspot::NAME, pickspot::PickspotDriver::boxed);
        registry
    }

    /// Register a venue constructor under a name.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        self.factories.insert(name, factory);
    }

    /// Whether `name` is a known venue.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered venue names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Construct a driver for `name` bound to `page`.
    pub fn create(
        &self,
        name: &str,
        page: PageHandle,
        context: ProviderContext,
    ) -> Result<Box<dyn ProviderDriver>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ProviderError::UnknownProvider(name.to_string()))?;
        Ok(factory(page, context))
    }
}

// ---------------------------------------------------------------------------
// Shared driver helpers
// ---------------------------------------------------------------------------

/// Fill in a generic two-field login form and submit it.
pub(crate) async fn submit_login_form(
    page: &PageHandle,
    credentials: &Credentials,
    username_selector: &str,
    password_selector: &str,
    submit_selector: &str,
) -> Result<()> {
    page.type_text(username_selector, &credentials.username).await?;
    page.type_text(password_selector, &credentials.password).await?;
    page.click(submit_selector).await?;
    Ok(())
}

/// Derive the canonical sorted-name match id for every raw entry.
///
/// Venue-local ids (row attributes, positions) are not portable across
/// polls, so every driver re-keys on participant display names.
pub(crate) fn derive_match_ids(raws: &mut [RawMatchInfo]) {
    for raw in raws {
        let names: Vec<&str> = raw.outright_odds.keys().map(String::as_str).collect();
        raw.id = MatchId::from_participants(&names).as_str().to_string();
    }
}

/// Wrap a step error as a fatal authentication failure.
pub(crate) fn auth_failed(provider: &'static str, error: Error) -> Error {
    ProviderError::Authentication {
        provider,
        reason: error.to_string(),
    }
    .into()
}

/// Wrap a step error as this section currently having no offerings.
pub(crate) fn section_unavailable(section: &Section, error: Error) -> Error {
    ProviderError::SectionUnavailable {
        section: section.to_string(),
        reason: error.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_knows_all_venues() {
        let registry = DriverRegistry::with_builtin();
        assert_eq!(registry.names(), vec!["bookline", "pickspot", "wagerhall"]);
        assert!(registry.contains("bookline"));
        assert!(!registry.contains("betsonic"));
    }

    #[test]
    fn derive_match_ids_sorts_names() {
        let mut raws = vec![RawMatchInfo {
            id: String::new(),
            outright_odds: [
                ("Zed".to_string(), "+110".to_string()),
                ("Ada".to_string(), "-130".to_string()),
            ]
            .into_iter()
            .collect(),
            spread_odds: Default::default(),
            participant_index: Default::default(),
        }];
        derive_match_ids(&mut raws);
        assert_eq!(raws[0].id, "Ada|Zed");
    }
}
