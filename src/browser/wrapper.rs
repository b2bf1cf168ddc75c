//! Browser lifecycle for a single automation run

use chromiumoxide::browser::Browser;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Wrapper for Browser and its event handler task
///
/// Handler MUST be aborted to prevent it running indefinitely after the
/// browser is closed; `Drop` takes care of that.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    temp_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    /// `temp_dir` is only set for throwaway profiles and is removed on cleanup
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, temp_dir: Option<PathBuf>) -> Self {
        Self {
            browser,
            handler,
            temp_dir,
        }
    }

    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    pub(crate) fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// Remove the throwaway profile (blocking)
    ///
    /// MUST be called AFTER `browser.wait()` completes so Chrome has released
    /// its file handles.
    pub fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.temp_dir.take() {
            info!("Cleaning up temp directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        self.handler.abort();

        if let Some(path) = &self.temp_dir {
            warn!(
                "BrowserWrapper dropped without shutdown; temp directory orphaned: {}",
                path.display()
            );
        }
    }
}
