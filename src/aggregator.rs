//! Orchestrates a driver across its declared sections: one market snapshot,
//! or one committed wager.

use tracing::{debug, warn};

use crate::domain::{
    normalize_all, BetOutcome, BetRequest, MarketKind, MarketSnapshot, MatchInfo, Section,
};
use crate::error::{ProviderError, Result};
use crate::provider::ProviderDriver;

pub struct MatchAggregator;

impl MatchAggregator {
    /// Authenticate once, then accumulate normalized matches across every
    /// section the driver declares for `kind`, reading the bankroll from
    /// whatever page state remains at the end.
    ///
    /// A section that errors contributes nothing; the snapshot itself never
    /// fails because of one section.
    pub async fn market_snapshot(
        driver: &dyn ProviderDriver,
        kind: &MarketKind,
    ) -> Result<MarketSnapshot> {
        driver.authenticate().await?;

        let sections = driver.sections_for_kind(kind).await?;
        let mut matches = Vec::new();
        for section in &sections {
            match Self::snapshot_section(driver, section).await {
                Ok(mut infos) => {
                    debug!(section = %section, matches = infos.len(), "Section extracted");
                    matches.append(&mut infos);
                }
                Err(e) if e.is_section_scoped() => {
                    debug!(section = %section, error = %e, "Section unavailable, continuing");
                }
                Err(e) => {
                    warn!(section = %section, error = %e, "Section failed, continuing");
                }
            }
        }

        let bankroll = driver.bankroll().await?;
        Ok(MarketSnapshot { matches, bankroll })
    }

    async fn snapshot_section(
        driver: &dyn ProviderDriver,
        section: &Section,
    ) -> Result<Vec<MatchInfo>> {
        if !driver.navigate_to_section(section).await? {
            return Ok(Vec::new());
        }
        driver.await_market_ready(section).await?;
        let raws = driver.extract_raw_matches().await?;
        Ok(normalize_all(&raws))
    }

    /// Authenticate once, then try `place_stake` section by section in
    /// declared order. The first non-zero committed stake wins and stops the
    /// loop; if every section yields zero the bet fails with
    /// [`ProviderError::NoMatchingOffering`].
    pub async fn place_bet(
        driver: &dyn ProviderDriver,
        request: &BetRequest,
    ) -> Result<BetOutcome> {
        driver.authenticate().await?;

        let sections = driver.sections_for_kind(&request.kind).await?;
        for section in &sections {
            match driver.place_stake(section, request.bet_type, request).await {
                Ok(committed) if !committed.is_zero() => {
                    return Ok(BetOutcome {
                        committed_stake: committed,
                        section: section.clone(),
                    });
                }
                Ok(_) => {
                    debug!(section = %section, match_id = %request.match_id, "Not placed in this section");
                }
                Err(e) if e.is_section_scoped() => {
                    warn!(section = %section, error = %e, "Section attempt aborted, falling through");
                }
                Err(e) => return Err(e),
            }
        }

        Err(ProviderError::NoMatchingOffering {
            match_id: request.match_id.to_string(),
        }
        .into())
    }
}
