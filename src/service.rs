//! The inbound facade: each operation leases a session, opens its own
//! exclusive page, runs a driver to completion, and releases the lease on
//! every exit path.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::aggregator::MatchAggregator;
use crate::artifact::{ArtifactStore, FsArtifactStore};
use crate::browser::{CdpBackend, SessionPool};
use crate::config::{Config, TimeoutConfig};
use crate::domain::{BetRequest, MarketKind, MarketSnapshot};
use crate::error::{ProviderError, Result};
use crate::provider::{
    CredentialStore, DriverRegistry, JsonFileCredentials, ProviderContext,
};

/// External result of a committed wager.
#[derive(Debug, Clone, Serialize)]
pub struct BetReceipt {
    pub committed_stake: Decimal,
}

/// Owns the session pool and the venue registry, and exposes the two
/// inbound operations.
pub struct Service {
    pool: SessionPool<CdpBackend>,
    registry: DriverRegistry,
    credentials: Arc<dyn CredentialStore>,
    artifacts: Arc<dyn ArtifactStore>,
    timeouts: TimeoutConfig,
    dry_run: bool,
    test_mode: bool,
}

impl Service {
    pub fn new(config: &Config) -> Result<Self> {
        let mut browser = config.browser.clone();
        if config.test_mode {
            // Headful in test mode so kept-open pages can be inspected.
            browser.headless = false;
        }
        let pool = SessionPool::new(CdpBackend::new(browser), config.pool.max_session_age());
        let credentials = Arc::new(JsonFileCredentials::load(&config.credentials.path)?);
        let artifacts = Arc::new(FsArtifactStore::new(config.artifacts.dir.clone()));

        Ok(Self {
            pool,
            registry: DriverRegistry::with_builtin(),
            credentials,
            artifacts,
            timeouts: config.timeouts.clone(),
            dry_run: config.dry_run,
            test_mode: config.test_mode,
        })
    }

    /// Extract one normalized market snapshot from `provider` for `kind`.
    pub async fn market_snapshot(
        &self,
        provider: &str,
        kind: &MarketKind,
    ) -> Result<MarketSnapshot> {
        let context = self.context_for(provider)?;
        info!(provider, kind = %kind, "Market snapshot requested");

        self.pool
            .with_session(|session| async move {
                let page = session.open_page(self.timeouts.clone()).await?;
                let driver = self.registry.create(provider, page.clone(), context)?;
                let result = MatchAggregator::market_snapshot(driver.as_ref(), kind).await;
                if !self.test_mode {
                    let _ = page.close().await;
                }
                result
            })
            .await
    }

    /// Place one wager on `provider`, failing with
    /// [`ProviderError::NoMatchingOffering`] when no section takes it.
    pub async fn place_bet(&self, provider: &str, request: BetRequest) -> Result<BetReceipt> {
        let context = self.context_for(provider)?;
        info!(
            provider,
            match_id = %request.match_id,
            tracking_id = %request.tracking_id,
            stake = %request.stake,
            "Bet placement requested"
        );

        let request = &request;
        let outcome = self
            .pool
            .with_session(|session| async move {
                let page = session.open_page(self.timeouts.clone()).await?;
                let driver = self.registry.create(provider, page.clone(), context)?;
                let result = MatchAggregator::place_bet(driver.as_ref(), request).await;
                if !self.test_mode {
                    let _ = page.close().await;
                }
                result
            })
            .await?;

        info!(
            provider,
            section = %outcome.section,
            committed = %outcome.committed_stake,
            "Bet committed"
        );
        Ok(BetReceipt {
            committed_stake: outcome.committed_stake,
        })
    }

    /// Tear down all browser sessions. Call after the last operation.
    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }

    /// Resolve provider name to a driver context, failing fast before any
    /// session is leased.
    fn context_for(&self, provider: &str) -> Result<ProviderContext> {
        if !self.registry.contains(provider) {
            return Err(ProviderError::UnknownProvider(provider.to_string()).into());
        }
        Ok(ProviderContext {
            credentials: self.credentials.lookup(provider)?,
            artifacts: Arc::clone(&self.artifacts),
            dry_run: self.dry_run,
        })
    }
}
