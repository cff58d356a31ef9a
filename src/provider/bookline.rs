//! Bookline venue driver.
//!
//! Menu-driven venue: one long-lived sportsbook page, sections reached
//! through a league side-menu that intermittently hides behind splash
//! promos (hence the interactive retry on navigation). The market board
//! carries both moneyline and spread columns; the stake limit in the bet
//! slip loads via AJAX after the outcome is selected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::artifact::{audit_key, ArtifactStore};
use crate::browser::PageHandle;
use crate::domain::odds::parse_money_string;
use crate::domain::{clamp_stake, BetRequest, BetType, MarketKind, RawMatchInfo, Section};
use crate::error::{ProviderError, Result};
use crate::provider::retry::{poll_until, with_retries};
use crate::provider::{
    auth_failed, derive_match_ids, section_unavailable, submit_login_form, Credentials,
    ProviderContext, ProviderDriver,
};

pub const NAME: &str = "bookline";

const LOGIN_URL: &str = "https://www.bookline.bet/";

// Login form; the sport tab doubles as the already-authenticated marker.
const SPORT_TAB: &str = "a.sport-nav[data-sport=\"tennis\"]";
const AUTH_GATE: &str = "#username, a.sport-nav[data-sport=\"tennis\"]";
const LOGIN_SUBMIT: &str = "#login-box input[type=\"submit\"]";

// Market board.
const MARKET_BOARD: &str = "div.market-board app-league-block";
const EVENT_ROW: &str = "app-event-row div.event-card";

// Account balance dropdown; the total is the third entry.
const BALANCE_PANEL: &str = "app-balance-panel";
const BALANCE_TOTAL_ITEM: &str = "ul.balance-menu li.balance-item:nth-child(3)";

// Bet slip.
const MAX_STAKE_LABEL: &str = ".bet-slip .limits a:nth-child(2) .amount";
const RISK_INPUT: &str = ".bet-slip input[aria-label=\"Risk\"]";
const PLACE_BUTTON: &str = ".bet-slip .place-wager button";

/// Attribute used to tag the outcome control located by in-page search.
const PICK_TAG: &str = "data-og-pick";

const MENU_ATTEMPTS: u32 = 3;
const MENU_WAIT: Duration = Duration::from_secs(2);
/// Settle time after navigation before the board is worth querying.
const RENDER_SETTLE: Duration = Duration::from_millis(800);
/// Settle time for the commit request after the place click.
const COMMIT_SETTLE: Duration = Duration::from_millis(1000);
/// Interval while polling the AJAX-loaded stake limit.
const STAKE_POLL_INTERVAL: Duration = Duration::from_millis(200);

const MENS_SECTIONS: [&str; 3] = ["mens_tour", "mens_qualifiers", "mens_challenger"];
const WOMENS_SECTIONS: [&str; 3] = ["womens_tour", "womens_qualifiers", "womens_itf"];

/// League-menu button per section.
fn section_button(section: &Section) -> Option<&'static str> {
    match section.as_str() {
        "mens_tour" => Some("a#league_4110"),
        "mens_qualifiers" => Some("a#league_4118"),
        "mens_challenger" => Some("a#league_4121"),
        "womens_tour" => Some("a#league_4111"),
        "womens_qualifiers" => Some("a#league_4119"),
        "womens_itf" => Some("a#league_4127"),
        _ => None,
    }
}

/// In-page extraction over the two-competitor event cards.
const EXTRACT_SCRIPT: &str = r#"(() => {
    const entries = [];
    document.querySelectorAll("app-event-row div.event-card").forEach((card) => {
        const nameNodes = card.querySelectorAll(".competitors .competitor-name");
        const priceNodes = card.querySelectorAll(".moneyline .price-btn");
        const spreadNodes = card.querySelectorAll(".spread .price-btn");
        if (nameNodes.length !== 2 || priceNodes.length !== 2) return;
        const entry = { id: "", outrightOdds: {}, spreadOdds: {}, participantIndex: {} };
        for (let i = 0; i < 2; i++) {
            const name = nameNodes[i].innerText.trim();
            entry.outrightOdds[name] = priceNodes[i].innerText.trim();
            entry.participantIndex[name] = i;
            if (spreadNodes.length === 2) {
                const parts = spreadNodes[i].innerText.trim().split(/\s+/);
                if (parts.length === 2) entry.spreadOdds[name] = [parts[1], parts[0]];
            }
        }
        entries.push(entry);
    });
    return entries;
})()"#;

pub struct BooklineDriver {
    page: PageHandle,
    credentials: Credentials,
    artifacts: Arc<dyn ArtifactStore>,
    dry_run: bool,
}

impl BooklineDriver {
    pub fn new(page: PageHandle, context: ProviderContext) -> Self {
        Self {
            page,
            credentials: context.credentials,
            artifacts: context.artifacts,
            dry_run: context.dry_run,
        }
    }

    pub fn boxed(page: PageHandle, context: ProviderContext) -> Box<dyn ProviderDriver> {
        Box::new(Self::new(page, context))
    }

    /// Locate the outcome control for (match, participant, column) by
    /// sorted-name id and tag it for a native click.
    fn pick_script(match_id: &str, index: usize, bet_type: BetType) -> Result<String> {
        let column = match bet_type {
            BetType::Outright => ".moneyline",
            BetType::Spread => ".spread",
        };
        let target = serde_json::to_string(match_id)?;
        Ok(format!(
            r#"(() => {{
                const target = {target};
                let found = false;
                document.querySelectorAll("app-event-row div.event-card").forEach((card) => {{
                    if (found) return;
                    const nameNodes = card.querySelectorAll(".competitors .competitor-name");
                    if (nameNodes.length !== 2) return;
                    const names = [nameNodes[0].innerText.trim(), nameNodes[1].innerText.trim()];
                    names.sort();
                    if (names.join("|") !== target) return;
                    const buttons = card.querySelectorAll("{column} .price-btn");
                    if (buttons.length !== 2) return;
                    buttons[{index}].setAttribute("{PICK_TAG}", "1");
                    found = true;
                }});
                return found;
            }})()"#
        ))
    }

    /// Read the AJAX-loaded stake limit from the open bet slip.
    async fn read_venue_max(&self) -> Result<Decimal> {
        let timeouts = self.page.timeouts().clone();
        self.page
            .wait_for_selector(MAX_STAKE_LABEL, timeouts.navigation())
            .await
            .map_err(|e| ProviderError::StakeRead(e.to_string()))?;

        let text = poll_until(timeouts.stake_read(), STAKE_POLL_INTERVAL, || async {
            Ok(self
                .page
                .inner_text(MAX_STAKE_LABEL)
                .await?
                .filter(|s| !s.trim().is_empty()))
        })
        .await?;

        let text = text.ok_or_else(|| {
            ProviderError::StakeRead("stake limit label never populated".into())
        })?;
        parse_money_string(&text)
            .map_err(|e| ProviderError::StakeRead(e.to_string()).into())
    }
}

#[async_trait]
impl ProviderDriver for BooklineDriver {
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
            .wait_for_selector(AUTH_GATE, timeouts.auth())
            .await
            .map_err(|e| auth_failed(NAME, e))?;

        if self.page.try_find(SPORT_TAB).await.is_some() {
            debug!("Session already authenticated, skipping login form");
            return Ok(());
        }

        submit_login_form(&self.page, &self.credentials, "#username", "#password", LOGIN_SUBMIT)
            .await
            .map_err(|e| auth_failed(NAME, e))
    }

    async fn await_auth_done(&self) -> Result<()> {
        // The login bounces through two redirects, so wait for the sport tab
        // to exist rather than counting navigation events.
        let timeouts = self.page.timeouts().clone();
        self.page
            .wait_for_selector(SPORT_TAB, timeouts.auth())
            .await
            .map_err(|e| auth_failed(NAME, e))?;
        Ok(())
    }

    async fn sections_for_kind(&self, kind: &MarketKind) -> Result<Vec<Section>> {
        let sections: &[&str] = match kind.as_str() {
            "mens" => &MENS_SECTIONS,
            "womens" => &WOMENS_SECTIONS,
            _ => &[],
        };
        Ok(sections.iter().copied().map(Section::from).collect())
    }

    async fn navigate_to_section(&self, section: &Section) -> Result<bool> {
        let Some(button) = section_button(section) else {
            return Err(ProviderError::SectionUnavailable {
                section: section.to_string(),
                reason: "no league button mapped".into(),
            }
            .into());
        };

        let pause = self.page.timeouts().interactive_pause();
        let result = with_retries(
            MENU_ATTEMPTS,
            pause,
            |_| async move {
                if self.page.try_find(button).await.is_none()
                    && self.page.wait_for_selector(button, MENU_WAIT).await.is_err()
                {
                    // The league is not offered right now.
                    return Ok(false);
                }
                if !self.page.is_visible(button).await? {
                    // A splash promo or collapsed menu is covering the
                    // league list; re-open the sport tab and go again.
                    let _ = self.page.click(SPORT_TAB).await;
                    return Err(ProviderError::TransientUi(format!(
                        "league button '{button}' present but not visible"
                    ))
                    .into());
                }
                self.page.click(button).await?;
                Ok(true)
            },
            |e| matches!(e, crate::error::Error::Provider(ProviderError::TransientUi(_))),
        )
        .await;

        result.map_err(|e| {
            if e.is_section_scoped() {
                e
            } else {
                section_unavailable(section, e)
            }
        })
    }

    async fn await_market_ready(&self, section: &Section) -> Result<()> {
        let timeout = self.page.timeouts().market_ready();
        tokio::time::sleep(RENDER_SETTLE).await;
        self.page
            .wait_for_selector(MARKET_BOARD, timeout)
            .await
            .map_err(|e| section_unavailable(section, e))?;
        // The board renders for every sport; the event card selector only
        // exists once actual tennis offerings are in.
        self.page
            .wait_for_selector(EVENT_ROW, timeout)
            .await
            .map_err(|e| section_unavailable(section, e))?;
        Ok(())
    }

    async fn extract_raw_matches(&self) -> Result<Vec<RawMatchInfo>> {
        let mut raws: Vec<RawMatchInfo> = self.page.evaluate(EXTRACT_SCRIPT).await?;
        derive_match_ids(&mut raws);
        Ok(raws)
    }

    async fn bankroll(&self) -> Result<Decimal> {
        let timeouts = self.page.timeouts().clone();
        self.page
            .wait_for_selector(BALANCE_PANEL, timeouts.navigation())
            .await?;

        let text = self
            .page
            .inner_text(BALANCE_TOTAL_ITEM)
            .await?
            .unwrap_or_default();
        if !text.trim_start().starts_with("Total") {
            return Err(ProviderError::ExtractionMismatch(format!(
                "balance entry is not the total: '{text}'"
            ))
            .into());
        }
        let amount = text.split(':').nth(1).ok_or_else(|| {
            ProviderError::ExtractionMismatch(format!("malformed balance entry: '{text}'"))
        })?;
        Ok(parse_money_string(amount)?)
    }

    async fn place_stake(
        &self,
        section: &Section,
        bet_type: BetType,
        request: &BetRequest,
    ) -> Result<Decimal> {
        if !self.navigate_to_section(section).await? {
            return Ok(Decimal::ZERO);
        }
        self.await_market_ready(section).await?;

        let raws = self.extract_raw_matches().await?;
        let Some(raw) = raws.iter().find(|r| r.id == request.match_id.as_str()) else {
            return Ok(Decimal::ZERO);
        };
        let Some(&index) = raw.participant_index.get(&request.participant) else {
            return Ok(Decimal::ZERO);
        };

        let script = Self::pick_script(request.match_id.as_str(), index, bet_type)?;
        let found: bool = self.page.evaluate(script).await?;
        if !found {
            return Ok(Decimal::ZERO);
        }
        self.page.click(&format!("[{PICK_TAG}]")).await?;

        let venue_max = self.read_venue_max().await?;
        let committed = clamp_stake(request.stake, venue_max);
        self.page
            .type_text(RISK_INPUT, &committed.to_string())
            .await?;

        let pre = self.page.screenshot_png().await?;
        self.artifacts
            .put(&audit_key(NAME, &request.tracking_id, "pre"), &pre)
            .await?;

        if self.dry_run {
            info!(match_id = %request.match_id, stake = %committed, "Dry run: skipping commit");
        } else {
            self.page.click(PLACE_BUTTON).await?;
        }
        tokio::time::sleep(COMMIT_SETTLE).await;

        let post = self.page.screenshot_png().await?;
        self.artifacts
            .put(&audit_key(NAME, &request.tracking_id, "post"), &post)
            .await?;

        info!(
            section = %section,
            match_id = %request.match_id,
            participant = %request.participant,
            requested = %request.stake,
            committed = %committed,
            "Stake entered"
        );
        Ok(committed)
    }
}
