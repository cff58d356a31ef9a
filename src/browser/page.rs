//! Page wrapper: the exclusive, per-request view of a browser session.
//!
//! Wraps `chromiumoxide::Page` with the bounded-wait helpers drivers need.
//! CDP has no built-in wait-for-selector, so waits are explicit polls with a
//! deadline; exceeding one surfaces as [`Error::Timeout`] and is classified
//! by the call site as benign or fatal.

use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use serde::de::DeserializeOwned;

use crate::config::TimeoutConfig;
use crate::error::{Error, Result};

/// Interval between find-element attempts while waiting on a selector.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An ephemeral page bound to exactly one browser session, exclusively owned
/// by one in-flight request.
#[derive(Clone)]
pub struct PageHandle {
    page: Page,
    timeouts: TimeoutConfig,
}

impl PageHandle {
    pub fn new(page: Page, timeouts: TimeoutConfig) -> Self {
        Self { page, timeouts }
    }

    /// Per-step timeouts configured for this page.
    #[must_use]
    pub fn timeouts(&self) -> &TimeoutConfig {
        &self.timeouts
    }

    /// Navigate to `url` and wait for the navigation to settle, bounded by
    /// the navigation timeout.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, Error>(())
        };
        tokio::time::timeout(self.timeouts.navigation(), navigation)
            .await
            .map_err(|_| Error::Timeout(self.timeouts.navigation(), format!("navigation to {url}")))?
    }

    /// Wait until `selector` matches an element, polling up to `timeout`.
    pub async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<Element> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(timeout, format!("selector '{selector}'")));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    /// Find an element right now, without waiting.
    pub async fn try_find(&self, selector: &str) -> Option<Element> {
        self.page.find_element(selector).await.ok()
    }

    /// Whether `selector` matches an element that is actually rendered
    /// (present, displayed, non-transparent, non-zero height).
    pub async fn is_visible(&self, selector: &str) -> Result<bool> {
        let selector_json = serde_json::to_string(selector)?;
        let script = format!(
            "(() => {{
                const e = document.querySelector({selector_json});
                if (!e) return false;
                const style = window.getComputedStyle(e);
                return style.display !== 'none' && style.visibility !== 'hidden'
                    && style.opacity !== '0' && e.offsetHeight !== 0;
            }})()"
        );
        self.evaluate(script).await
    }

    /// Click the first element matching `selector`.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        Ok(())
    }

    /// Click into the element matching `selector` and type `text`.
    pub async fn type_text(&self, selector: &str, text: &str) -> Result<()> {
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        element.type_str(text).await?;
        Ok(())
    }

    /// Inner text of the first element matching `selector`, if any.
    pub async fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(element.inner_text().await?),
            Err(_) => Ok(None),
        }
    }

    /// Evaluate a JavaScript expression and deserialize its value.
    pub async fn evaluate<T: DeserializeOwned>(&self, script: impl Into<String>) -> Result<T> {
        let result = self.page.evaluate(script.into()).await?;
        Ok(result.into_value::<T>()?)
    }

    /// Capture a PNG screenshot of the current viewport.
    pub async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    /// Close the underlying page.
    pub async fn close(self) -> Result<()> {
        self.page.close().await?;
        Ok(())
    }
}
