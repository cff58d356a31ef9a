//! Browser session lifecycle: launching Chromium over CDP and tearing it
//! down again.
//!
//! The pool is generic over [`SessionBackend`] so its lifecycle invariants
//! can be exercised without a real browser.

use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as ChromeLaunchConfig};
use futures_util::StreamExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::browser::page::PageHandle;
use crate::config::{BrowserConfig, TimeoutConfig};
use crate::error::{PoolError, Result};

/// Creates and destroys the expensive session objects the pool manages.
#[async_trait]
pub trait SessionBackend: Send + Sync + 'static {
    type Session: Send + Sync + 'static;

    /// Create a fresh session. No internal retry: a failure here is fanned
    /// out to every caller awaiting the in-flight creation.
    async fn create(&self) -> Result<Self::Session>;

    /// Destroy a session. Called exactly once per session, only after it has
    /// been superseded and its last lease released.
    async fn teardown(&self, session: Arc<Self::Session>);
}

/// An owned Chromium instance driven over CDP.
///
/// The CDP event handler runs on its own task for the lifetime of the
/// session; pages are opened against the shared browser connection.
pub struct BrowserSession {
    browser: Mutex<Browser>,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a Chromium instance with the configured window and headless
    /// mode, and spawn its CDP event loop.
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut builder =
            ChromeLaunchConfig::builder().window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        let launch_config = builder
            .build()
            .map_err(PoolError::CreationFailed)?;

        let (browser, mut handler) = Browser::launch(launch_config).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
            debug!("CDP handler loop ended");
        });

        Ok(Self {
            browser: Mutex::new(browser),
            handler_task,
        })
    }

    /// Open a fresh page against this session.
    pub async fn open_page(&self, timeouts: TimeoutConfig) -> Result<PageHandle> {
        let browser = self.browser.lock().await;
        let page = browser.new_page("about:blank").await?;
        Ok(PageHandle::new(page, timeouts))
    }

    /// Close the browser process and stop the CDP event loop.
    pub async fn close(&self) {
        let mut browser = self.browser.lock().await;
        if let Err(e) = browser.close().await {
            warn!(error = %e, "Browser close failed");
        }
        let _ = browser.wait().await;
        self.handler_task.abort();
    }
}

/// Production [`SessionBackend`]: launches real Chromium sessions.
pub struct CdpBackend {
    config: BrowserConfig,
}

impl CdpBackend {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SessionBackend for CdpBackend {
    type Session = BrowserSession;

    async fn create(&self) -> Result<BrowserSession> {
        BrowserSession::launch(&self.config).await
    }

    async fn teardown(&self, session: Arc<BrowserSession>) {
        session.close().await;
    }
}
