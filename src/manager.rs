//! Per-run browser session
//!
//! Every submission gets its own `BrowserManager`, so runs never share a
//! Chrome process.
//!
//! # Async Lock Requirements
//!
//! Uses `tokio::sync::Mutex`: browser operations are async and the guard is
//! held across `.await` points.

use std::sync::atomic::{AtomicU64, Ordering};

use chromiumoxide::page::Page;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::BrowserConfig;
use crate::browser::{BrowserError, BrowserResult, BrowserWrapper};
use crate::browser_setup::launch_browser;

static LAUNCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Lazily launched browser with health checking
///
/// The browser is started on the first `new_page()` call. `shutdown()`
/// closes it, waits for the process to exit, and removes a temp profile.
pub struct BrowserManager {
    config: BrowserConfig,
    browser: Mutex<Option<BrowserWrapper>>,
}

impl BrowserManager {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            browser: Mutex::new(None),
        }
    }

    /// Ensure a live browser exists, relaunching if the previous one crashed
    async fn ensure_running(&self, guard: &mut Option<BrowserWrapper>) -> BrowserResult<()> {
        if let Some(wrapper) = guard.as_ref() {
            match wrapper.browser().version().await {
                Ok(_) => {
                    debug!("Browser health check passed");
                    return Ok(());
                }
                Err(e) => {
                    warn!("Browser health check failed: {}. Relaunching", e);
                    if let Some(mut crashed) = guard.take() {
                        let _ = crashed.browser_mut().close().await;
                        let _ = crashed.browser_mut().wait().await;
                        crashed.cleanup_temp_dir();
                    }
                }
            }
        }

        let launch_id = LAUNCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let (browser, handler, temp_dir) = launch_browser(&self.config, launch_id)
            .await
            .map_err(|e| BrowserError::LaunchFailed(format!("{e:#}")))?;
        *guard = Some(BrowserWrapper::new(browser, handler, temp_dir));
        Ok(())
    }

    /// Open a new tab at `url`, launching the browser on first use
    pub async fn new_page(&self, url: &str) -> BrowserResult<Page> {
        let mut guard = self.browser.lock().await;
        self.ensure_running(&mut guard).await?;

        let wrapper = guard
            .as_ref()
            .ok_or_else(|| BrowserError::PageCreationFailed("Browser not available".into()))?;
        wrapper
            .browser()
            .new_page(url)
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))
    }

    /// Close the browser and clean up its profile
    ///
    /// We must call BOTH `close()` and `wait()`: dropping the wrapper only
    /// aborts the handler task, which leaves a zombie Chrome process.
    /// Safe to call multiple times.
    pub async fn shutdown(&self) {
        let mut guard = self.browser.lock().await;

        if let Some(mut wrapper) = guard.take() {
            info!("Shutting down browser");

            if let Err(e) = wrapper.browser_mut().close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }

            if let Err(e) = wrapper.browser_mut().wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }

            wrapper.cleanup_temp_dir();
        }
    }

    #[cfg(test)]
    async fn is_browser_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }
}
