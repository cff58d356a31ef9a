//! Pickspot venue driver.
//!
//! API-backed advisory venue: sections are the live leaves of its category
//! tree, and odds come from its JSON API rather than the page markup (the
//! page is only navigated so a human can follow along in test mode). Prices
//! are already decimal, so conversion is the pass-through path. The venue
//! takes no real stakes; the bankroll is a fixed notional used to normalize
//! stake sizing, and `place_stake` always reports "not placed".

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::debug;

use crate::browser::PageHandle;
use crate::domain::{BetRequest, BetType, MarketKind, MatchId, RawMatchInfo, Section};
use crate::error::{ProviderError, Result};
use crate::provider::{
    auth_failed, section_unavailable, submit_login_form, Credentials, ProviderContext,
    ProviderDriver,
};

pub const NAME: &str = "pickspot";

const LOGIN_URL: &str = "https://www.pickspot.net/signin";
const SITE_URL: &str = "https://www.pickspot.net";
const API_URL: &str = "https://api.pickspot.net";

const EMAIL_INPUT: &str = "input#email";
const PASSWORD_INPUT: &str = "input#pwd";
const SIGNIN_BUTTON: &str = "button#btn-signin";
const PROFILE_WIDGET: &str = "#account-header .mini-profile";
const CATEGORY_LIST: &str = "ul.category-events > li";

/// Normalizing notional: pickspot stakes are advisory, so the bankroll is a
/// constant that keeps downstream stake sizing comparable across venues.
const NOTIONAL_BANKROLL: Decimal = dec!(1000);

/// Market name the API uses for the outright winner.
const OUTRIGHT_MARKET: &str = "winner";

#[derive(Debug, Deserialize)]
struct CategoryNode {
    id: String,
    #[serde(rename = "lastCategory", default)]
    last_category: bool,
}

#[derive(Debug, Deserialize)]
struct EventSummary {
    slug: String,
    players: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EventDetails {
    #[serde(default)]
    active: bool,
    players: Vec<String>,
    #[serde(default)]
    odds: Vec<EventOdds>,
}

#[derive(Debug, Deserialize)]
struct EventOdds {
    name: String,
    #[serde(default)]
    data: Vec<OddsPoint>,
}

#[derive(Debug, Deserialize)]
struct OddsPoint {
    price: f64,
}

pub struct PickspotDriver {
    page: PageHandle,
    credentials: Credentials,
    http: reqwest::Client,
    /// Section the page last navigated to; extraction reads the API for it.
    current_section: Mutex<Option<Section>>,
}

impl PickspotDriver {
    pub fn new(page: PageHandle, context: ProviderContext) -> Self {
        Self {
            page,
            credentials: context.credentials,
            http: reqwest::Client::new(),
            current_section: Mutex::new(None),
        }
    }

    pub fn boxed(page: PageHandle, context: ProviderContext) -> Box<dyn ProviderDriver> {
        Box::new(Self::new(page, context))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{API_URL}{path}"))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Walk the category tree under `root` and collect its leaves, in API
    /// order.
    async fn category_leaves(&self, root: &str) -> Result<Vec<Section>> {
        let mut leaves = Vec::new();
        let mut pending: VecDeque<String> = VecDeque::from([root.to_string()]);

        while let Some(category) = pending.pop_front() {
            let children: Vec<CategoryNode> =
                self.get_json(&format!("/categories/{category}/children")).await?;
            for child in children {
                if child.last_category {
                    leaves.push(Section::new(child.id));
                } else {
                    pending.push_back(child.id);
                }
            }
        }

        Ok(leaves)
    }

    /// Outright odds for one event, or `None` when it is inactive or has no
    /// outright market.
    async fn raw_match_for_event(&self, slug: &str) -> Result<Option<RawMatchInfo>> {
        let mut matching: Vec<EventDetails> =
            self.get_json(&format!("/events/?filter=slug:{slug}")).await?;
        if matching.is_empty() {
            return Ok(None);
        }
        let details = matching.remove(0);
        if !details.active || details.players.len() != 2 {
            return Ok(None);
        }

        let Some(outright) = details.odds.iter().find(|o| o.name == OUTRIGHT_MARKET) else {
            return Ok(None);
        };
        if outright.data.len() != 2 {
            return Ok(None);
        }

        let mut raw = RawMatchInfo {
            id: MatchId::from_participants(&details.players).as_str().to_string(),
            outright_odds: Default::default(),
            spread_odds: Default::default(),
            participant_index: Default::default(),
        };
        for (index, player) in details.players.iter().enumerate() {
            // API prices are already decimal; stringified here they take the
            // pass-through branch of odds conversion.
            raw.outright_odds
                .insert(player.clone(), outright.data[index].price.to_string());
            raw.participant_index.insert(player.clone(), index);
        }
        Ok(Some(raw))
    }
}

#[async_trait]
impl ProviderDriver for PickspotDriver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn login_url(&self) -> &str {
        LOGIN_URL
    }

    async fn handle_auth(&self) -> Result<()> {
        let timeouts = self.page.timeouts().clone();
        self.page
            .goto(self.login_url())
            .await
            .map_err(|e| auth_failed(NAME, e))?;
        self.page
            .wait_for_selector(EMAIL_INPUT, timeouts.navigation())
            .await
            .map_err(|e| auth_failed(NAME, e))?;

        if self.page.try_find(PROFILE_WIDGET).await.is_some() {
            debug!("Session already authenticated, skipping login form");
            return Ok(());
        }

        submit_login_form(&self.page, &self.credentials, EMAIL_INPUT, PASSWORD_INPUT, SIGNIN_BUTTON)
            .await
            .map_err(|e| auth_failed(NAME, e))
    }

    async fn await_auth_done(&self) -> Result<()> {
        let timeouts = self.page.timeouts().clone();
        self.page
            .wait_for_selector(PROFILE_WIDGET, timeouts.auth())
            .await
            .map_err(|e| auth_failed(NAME, e))?;
        Ok(())
    }

    /// Queried live: the venue reshuffles its category tree as tournaments
    /// start and finish.
    async fn sections_for_kind(&self, kind: &MarketKind) -> Result<Vec<Section>> {
        let root = match kind.as_str() {
            "mens" => "tennis-mens",
            "womens" => "tennis-womens",
            _ => return Ok(Vec::new()),
        };
        self.category_leaves(root).await
    }

    async fn navigate_to_section(&self, section: &Section) -> Result<bool> {
        self.page
            .goto(&format!("{SITE_URL}/i/#!home/{section}"))
            .await
            .map_err(|e| section_unavailable(section, e))?;
        *self.current_section.lock() = Some(section.clone());
        Ok(true)
    }

    async fn await_market_ready(&self, section: &Section) -> Result<()> {
        self.page
            .wait_for_selector(CATEGORY_LIST, self.page.timeouts().market_ready())
            .await
            .map_err(|e| section_unavailable(section, e))?;
        Ok(())
    }

    async fn extract_raw_matches(&self) -> Result<Vec<RawMatchInfo>> {
        let section = self.current_section.lock().clone().ok_or_else(|| {
            ProviderError::ExtractionMismatch("extraction before any section navigation".into())
        })?;

        let events: Vec<EventSummary> =
            self.get_json(&format!("/categories/{section}/events")).await?;

        let mut raws = Vec::new();
        for event in events {
            // Doubles pairings share one slot per side; skip them.
            if event.players.iter().any(|p| p.contains('/')) {
                continue;
            }
            if let Some(raw) = self.raw_match_for_event(&event.slug).await? {
                raws.push(raw);
            }
        }
        Ok(raws)
    }

    async fn bankroll(&self) -> Result<Decimal> {
        Ok(NOTIONAL_BANKROLL)
    }

    async fn place_stake(
        &self,
        section: &Section,
        _bet_type: BetType,
        request: &BetRequest,
    ) -> Result<Decimal> {
        debug!(
            section = %section,
            match_id = %request.match_id,
            "Pickspot takes no real stakes; reporting not placed"
        );
        Ok(Decimal::ZERO)
    }
}
