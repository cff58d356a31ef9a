//! Wagerhall venue driver.
//!
//! URL-navigated venue: each section is a path segment, so navigation is a
//! plain goto. Login is never pre-established and is slow enough to need
//! the extended auth timeout. Staking goes through a bet slip that must be
//! cleared of leftover selections, and commit is a two-step
//! submit-then-confirm.

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
use crate::provider::retry::poll_until;
use crate::provider::{
    auth_failed, derive_match_ids, section_unavailable, submit_login_form, Credentials,
    ProviderContext, ProviderDriver,
};

pub const NAME: &str = "wagerhall";

const LOGIN_URL: &str = "https://www.wagerhall.bet/login";
const SPORTSBOOK_URL: &str = "https://www.wagerhall.bet/sportsbook/tennis";

const MEMBER_INPUT: &str = "#member-id";
const PIN_INPUT: &str = "#member-pin";
const LOGIN_SUBMIT: &str = "#login-submit";

const PERIOD_HEADER: &str = ".event-period-header";
const EVENT_GROUP: &str = "tbody.event-group";

const BALANCE_CURRENT: &str = "#AccountBalance";
const BALANCE_PENDING: &str = "#PendingStakes";

// Bet slip.
const SLIP_REMOVE: &str = "div.slip-remove";
const STRAIGHT_CELL: &str = "td.bet-type-straight.highlight";
const MAX_RISK_LABEL: &str = ".bet-slip .max-risk .amount";
const RISK_INPUT: &str = "input.risk-amount";
const SLIP_SUBMIT: &str = "button#slip-submit";
const SLIP_CONFIRM: &str = "button#slip-confirm";

/// Attribute used to tag the outcome cell located by in-page search.
const PICK_TAG: &str = "data-og-pick";

/// Settle time after content renders before extraction.
const RENDER_SETTLE: Duration = Duration::from_millis(1000);
/// Settle time for the wager request after submit/confirm clicks.
const COMMIT_SETTLE: Duration = Duration::from_millis(1000);
/// Interval while polling the stake limit in the slip.
const STAKE_POLL_INTERVAL: Duration = Duration::from_millis(200);
/// Leftover selections to clear from the slip, at most.
const MAX_SLIP_CLEARS: u32 = 10;

const MENS_SECTIONS: [&str; 2] = ["mens", "mens-qualifying"];
const WOMENS_SECTIONS: [&str; 2] = ["womens", "womens-qualifying"];

/// In-page extraction over the two-runner event groups.
///
/// Prop rows reuse the same markup with a bare surname; real match rows
/// carry "Lastname, Firstname", so rows without a comma are skipped.
const EXTRACT_SCRIPT: &str = r#"(() => {
    const entries = [];
    document.querySelectorAll("tbody.event-group").forEach((group) => {
        const rows = group.querySelectorAll("tr.runner-row");
        if (rows.length !== 2) return;
        const entry = { id: "", outrightOdds: {}, spreadOdds: {}, participantIndex: {} };
        for (let i = 0; i < 2; i++) {
            const nameNode = rows[i].querySelector("td.runner-name");
            const oddsNode = rows[i].querySelector("td.moneyline");
            if (!nameNode || !oddsNode) return;
            const name = nameNode.innerText.trim();
            if (!name.includes(",")) return;
            entry.outrightOdds[name] = oddsNode.innerText.trim();
            entry.participantIndex[name] = i;
        }
        entries.push(entry);
    });
    return entries;
})()"#;

pub struct WagerhallDriver {
    page: PageHandle,
    credentials: Credentials,
    artifacts: Arc<dyn ArtifactStore>,
    dry_run: bool,
}

impl WagerhallDriver {
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

    /// Tag the clickable outcome cell for (match, participant), keyed on the
    /// sorted-name match id. Returns whether a cell was tagged.
    fn pick_script(match_id: &str, participant: &str) -> Result<String> {
        let target = serde_json::to_string(match_id)?;
        let participant = serde_json::to_string(participant)?;
        Ok(format!(
            r#"(() => {{
                const target = {target};
                const participant = {participant};
                let found = false;
                document.querySelectorAll("tbody.event-group").forEach((group) => {{
                    if (found) return;
                    const rows = group.querySelectorAll("tr.runner-row");
                    if (rows.length !== 2) return;
                    const names = [];
                    let pickCell = null;
                    for (let i = 0; i < 2; i++) {{
                        const nameNode = rows[i].querySelector("td.runner-name");
                        const oddsNode = rows[i].querySelector("td.moneyline");
                        if (!nameNode || !oddsNode) return;
                        const name = nameNode.innerText.trim();
                        names.push(name);
                        if (name === participant) {{
                            pickCell = oddsNode.previousElementSibling;
                        }}
                    }}
                    names.sort();
                    if (names.join("|") !== target || !pickCell) return;
                    pickCell.setAttribute("{PICK_TAG}", "1");
                    found = true;
                }});
                return found;
            }})()"#
        ))
    }

    /// Remove any leftover selections from the bet slip.
    async fn clear_slip(&self) -> Result<()> {
        for _ in 0..MAX_SLIP_CLEARS {
            if self.page.try_find(SLIP_REMOVE).await.is_none() {
                return Ok(());
            }
            self.page.click(SLIP_REMOVE).await?;
        }
        debug!("Bet slip still has selections after clearing; continuing");
        Ok(())
    }

    /// Read the stake limit displayed in the slip.
    async fn read_venue_max(&self) -> Result<Decimal> {
        let timeouts = self.page.timeouts().clone();
        let text = poll_until(timeouts.stake_read(), STAKE_POLL_INTERVAL, || async {
            Ok(self
                .page
                .inner_text(MAX_RISK_LABEL)
                .await?
                .filter(|s| !s.trim().is_empty()))
        })
        .await?;

        let text = text.ok_or_else(|| {
            ProviderError::StakeRead("max risk label never populated".into())
        })?;
        parse_money_string(&text)
            .map_err(|e| ProviderError::StakeRead(e.to_string()).into())
    }

    async fn balance_component(&self, selector: &str) -> Result<Decimal> {
        let timeouts = self.page.timeouts().clone();
        self.page
            .wait_for_selector(selector, timeouts.navigation())
            .await?;
        let text = self.page.inner_text(selector).await?.unwrap_or_default();
        parse_money_string(&text).map_err(|e| {
            ProviderError::ExtractionMismatch(format!("balance '{selector}': {e}")).into()
        })
    }
}

#[async_trait]
impl ProviderDriver for WagerhallDriver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn login_url(&self) -> &str {
        LOGIN_URL
    }

    async fn handle_auth(&self) -> Result<()> {
        // Wagerhall never keeps us logged in; always run the form.
        let timeouts = self.page.timeouts().clone();
        self.page
            .goto(self.login_url())
            .await
            .map_err(|e| auth_failed(NAME, e))?;
        self.page
            .wait_for_selector(MEMBER_INPUT, timeouts.navigation())
            .await
            .map_err(|e| auth_failed(NAME, e))?;

        submit_login_form(&self.page, &self.credentials, MEMBER_INPUT, PIN_INPUT, LOGIN_SUBMIT)
            .await
            .map_err(|e| auth_failed(NAME, e))
    }

    async fn await_auth_done(&self) -> Result<()> {
        // Login is slow here; the account balance widget is the stable
        // marker of a completed login, whatever it redirected through.
        let timeouts = self.page.timeouts().clone();
        self.page
            .wait_for_selector(BALANCE_CURRENT, timeouts.auth())
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
        self.page
            .goto(&format!("{SPORTSBOOK_URL}/{section}"))
            .await
            .map_err(|e| section_unavailable(section, e))?;
        self.page
            .wait_for_selector(PERIOD_HEADER, self.page.timeouts().navigation())
            .await
            .map_err(|e| section_unavailable(section, e))?;
        Ok(true)
    }

    async fn await_market_ready(&self, section: &Section) -> Result<()> {
        self.page
            .wait_for_selector(EVENT_GROUP, self.page.timeouts().market_ready())
            .await
            .map_err(|e| section_unavailable(section, e))?;
        tokio::time::sleep(RENDER_SETTLE).await;
        Ok(())
    }

    async fn extract_raw_matches(&self) -> Result<Vec<RawMatchInfo>> {
        let mut raws: Vec<RawMatchInfo> = self.page.evaluate(EXTRACT_SCRIPT).await?;
        derive_match_ids(&mut raws);
        Ok(raws)
    }

    async fn bankroll(&self) -> Result<Decimal> {
        let current = self.balance_component(BALANCE_CURRENT).await?;
        let pending = self.balance_component(BALANCE_PENDING).await?;
        Ok(current + pending)
    }

    async fn place_stake(
        &self,
        section: &Section,
        _bet_type: BetType,
        request: &BetRequest,
    ) -> Result<Decimal> {
        if !self.navigate_to_section(section).await? {
            return Ok(Decimal::ZERO);
        }
        self.await_market_ready(section).await?;
        self.clear_slip().await?;

        let script = Self::pick_script(request.match_id.as_str(), &request.participant)?;
        let found: bool = self.page.evaluate(script).await?;
        if !found {
            return Ok(Decimal::ZERO);
        }
        self.page.click(&format!("[{PICK_TAG}]")).await?;

        // Select the straight-wager type before the slip accepts a risk
        // amount.
        self.page
            .wait_for_selector(STRAIGHT_CELL, self.page.timeouts().navigation())
            .await?;
        self.page.click(STRAIGHT_CELL).await?;

        let venue_max = self.read_venue_max().await?;
        let committed = clamp_stake(request.stake, venue_max);
        self.page
            .type_text(RISK_INPUT, &committed.to_string())
            .await?;

        tokio::time::sleep(self.page.timeouts().interactive_pause()).await;
        self.page.click(SLIP_SUBMIT).await?;
        tokio::time::sleep(COMMIT_SETTLE).await;

        let pre = self.page.screenshot_png().await?;
        self.artifacts
            .put(&audit_key(NAME, &request.tracking_id, "pre"), &pre)
            .await?;

        if self.dry_run {
            info!(match_id = %request.match_id, stake = %committed, "Dry run: skipping confirm");
        } else {
            self.page.click(SLIP_CONFIRM).await?;
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
