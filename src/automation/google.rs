//! Google Business reviews adapter
//!
//! Drives the public reviews dialog of a business listing: sort by newest,
//! scroll until the target review is matched, open the reply dialog, type,
//! submit.

use async_trait::async_trait;
use chrono::Utc;
use chromiumoxide::Page;
use chromiumoxide::element::Element;
use tracing::{debug, error, info, warn};
use url::Url;

use super::config::ResolvedTimeouts;
use super::matcher::{ReviewCandidate, ReviewTarget, select_review};
use super::{AutomationConfig, AutomationError, ReplyRequest, ReplySubmitter, SubmissionReceipt};
use crate::BrowserConfig;
use crate::manager::BrowserManager;
use crate::utils::{ConfigError, wait_for_element};

/// Production [`ReplySubmitter`]; each call launches and tears down its own browser
pub struct GoogleReviewsAdapter {
    browser: BrowserConfig,
    config: AutomationConfig,
    timeouts: ResolvedTimeouts,
}

impl GoogleReviewsAdapter {
    pub fn new(browser: BrowserConfig, config: AutomationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let timeouts = config.timeouts.resolve()?;
        Ok(Self {
            browser,
            config,
            timeouts,
        })
    }

    async fn run(
        &self,
        manager: &BrowserManager,
        request: &ReplyRequest,
    ) -> Result<SubmissionReceipt, AutomationError> {
        let selectors = &self.config.selectors;

        let page = manager.new_page("about:blank").await?;
        self.navigate(&page, &request.permalink).await?;

        tokio::time::sleep(self.config.pre_sort_delay()).await;
        let sort = wait_for_element(&page, &selectors.sort_newest, self.timeouts.sort).await?;
        click_element(&page, &sort, &selectors.sort_newest).await?;
        tokio::time::sleep(self.config.post_sort_delay()).await;

        match wait_for_element(&page, &selectors.reviews_panel, self.timeouts.reviews_panel).await {
            Ok(_) => {}
            Err(AutomationError::ElementTimeout { .. }) => return Err(AutomationError::ReviewsNotLoaded),
            Err(e) => return Err(e),
        }

        let (blocks, index) = self.locate_review(&page, request).await?;
        debug!("Matched review {} of {} for '{}'", index, blocks.len(), request.author);

        open_reply_dialog(&blocks[index], &selectors.reply_label, &request.author).await?;

        let frame = wait_for_element(&page, &selectors.reply_iframe, self.timeouts.iframe).await?;
        let src = frame
            .attribute("src")
            .await
            .ok()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .ok_or(AutomationError::IframeMissing)?;
        let page_url = page.url().await.ok().flatten().unwrap_or_default();
        let frame_url = resolve_frame_src(&page_url, &src)?;

        // The reply form lives in a cross-origin iframe; work on its document directly
        let frame_page = manager.new_page(&frame_url).await?;
        let textarea =
            wait_for_element(&frame_page, &selectors.reply_textarea, self.timeouts.iframe).await?;
        click_element(&frame_page, &textarea, &selectors.reply_textarea).await?;
        textarea
            .type_str(&request.text)
            .await
            .map_err(|e| AutomationError::ElementNotFound {
                selector: selectors.reply_textarea.clone(),
                reason: format!("typing failed: {e}"),
            })?;

        let submit =
            wait_for_element(&frame_page, &selectors.submit_button, self.timeouts.submit).await?;
        click_element(&frame_page, &submit, &selectors.submit_button).await?;
        tokio::time::sleep(self.config.post_submit_delay()).await;

        Ok(SubmissionReceipt {
            author: request.author.clone(),
            reply_chars: request.text.chars().count(),
        })
    }

    async fn navigate(&self, page: &Page, url: &str) -> Result<(), AutomationError> {
        info!("Navigating to {}", url);
        match tokio::time::timeout(self.timeouts.navigation, page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AutomationError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(AutomationError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {}ms", self.timeouts.navigation.as_millis()),
            }),
        }
    }

    /// Scroll the review list until exactly one block matches the request
    ///
    /// Stops early on success or on an ambiguous match; otherwise scrolls up
    /// to `scroll_iterations` times and returns the last matcher error.
    async fn locate_review(
        &self,
        page: &Page,
        request: &ReplyRequest,
    ) -> Result<(Vec<Element>, usize), AutomationError> {
        let selectors = &self.config.selectors;
        let target = ReviewTarget {
            author: &request.author,
            snippet: request.review_snippet.as_deref(),
            posted_at: request.posted_at,
        };

        let mut iteration = 0;
        loop {
            let (blocks, candidates) = self.collect_reviews(page).await?;
            let err = match select_review(&candidates, &target, Utc::now()) {
                Ok(index) => {
                    debug!("Found '{}' after {} scrolls", request.author, iteration);
                    return Ok((blocks, index));
                }
                Err(e @ AutomationError::AmbiguousAuthor { .. }) => return Err(e),
                Err(e) => e,
            };
            if iteration >= self.config.scroll_iterations {
                debug!(
                    "'{}' not matched after {} scrolls",
                    request.author, iteration
                );
                return Err(err);
            }
            iteration += 1;

            let container = match page.find_element(selectors.scroll_container.as_str()).await {
                Ok(el) => el,
                Err(e) => {
                    warn!(
                        "Scroll container '{}' not found: {}",
                        selectors.scroll_container, e
                    );
                    return Err(err);
                }
            };
            if let Err(e) = container
                .call_js_fn("function() { this.scrollTop = this.scrollHeight; }", false)
                .await
            {
                warn!("Scrolling the review list failed: {}", e);
                return Err(err);
            }
            tokio::time::sleep(self.config.scroll_pause()).await;
        }
    }

    async fn collect_reviews(
        &self,
        page: &Page,
    ) -> Result<(Vec<Element>, Vec<ReviewCandidate>), AutomationError> {
        let selectors = &self.config.selectors;
        let found = page
            .find_elements(selectors.review_block.as_str())
            .await
            .map_err(|e| AutomationError::ElementNotFound {
                selector: selectors.review_block.clone(),
                reason: e.to_string(),
            })?;

        let mut blocks = Vec::with_capacity(found.len());
        let mut candidates = Vec::with_capacity(found.len());
        for block in found {
            // The avatar is a contrib link too, with no text
            let Some(author) = first_text(&block, &selectors.author_anchor).await else {
                continue;
            };
            let date_label = first_text(&block, &selectors.review_date).await;
            let text = block.inner_text().await.ok().flatten().unwrap_or_default();
            candidates.push(ReviewCandidate {
                author,
                text,
                date_label,
            });
            blocks.push(block);
        }

        debug!("Collected {} review blocks", candidates.len());
        Ok((blocks, candidates))
    }
}

#[async_trait]
impl ReplySubmitter for GoogleReviewsAdapter {
    async fn submit(&self, request: &ReplyRequest) -> Result<SubmissionReceipt, AutomationError> {
        if request.permalink.trim().is_empty() {
            return Err(AutomationError::MissingPermalink {
                author: request.author.clone(),
            });
        }

        let manager = BrowserManager::new(self.browser.clone());
        let result = self.run(&manager, request).await;
        manager.shutdown().await;

        match &result {
            Ok(receipt) => info!(
                "Posted reply to '{}' ({} chars)",
                receipt.author, receipt.reply_chars
            ),
            Err(e) => error!("Submission for '{}' failed: {}", request.author, e),
        }
        result
    }
}

/// Trimmed text of the first element under `root` with non-blank text
async fn first_text(root: &Element, selector: &str) -> Option<String> {
    let elements = root.find_elements(selector).await.ok()?;
    let mut texts = Vec::with_capacity(elements.len());
    for element in elements {
        texts.push(element.inner_text().await.ok().flatten());
    }
    first_non_blank(texts)
}

fn first_non_blank(texts: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    texts
        .into_iter()
        .flatten()
        .map(|t| t.trim().to_string())
        .find(|t| !t.is_empty())
}

/// Click through the element's clickable point (bypasses IntersectionObserver hang)
async fn click_element(page: &Page, element: &Element, selector: &str) -> Result<(), AutomationError> {
    let not_clickable = |reason: String| AutomationError::ElementNotFound {
        selector: selector.to_string(),
        reason,
    };

    element
        .scroll_into_view()
        .await
        .map_err(|e| not_clickable(format!("scroll into view failed: {e}")))?;
    let point = element
        .clickable_point()
        .await
        .map_err(|e| not_clickable(format!("no clickable point: {e}")))?;
    page.click(point)
        .await
        .map_err(|e| not_clickable(format!("click failed: {e}")))?;
    Ok(())
}

async fn open_reply_dialog(block: &Element, label: &str, author: &str) -> Result<(), AutomationError> {
    let missing = || AutomationError::ReplyControlMissing {
        author: author.to_string(),
        label: label.to_string(),
    };

    let clicked = block
        .call_js_fn(reply_control_script(label), false)
        .await
        .map_err(|_| missing())?
        .result
        .value
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if clicked { Ok(()) } else { Err(missing()) }
}

/// JS run against a review block: click the innermost element showing `label`
fn reply_control_script(label: &str) -> String {
    let label = serde_json::Value::String(label.to_string()).to_string();
    format!(
        "function() {{
            const label = {label};
            const hits = Array.from(this.querySelectorAll('*'))
                .filter(el => (el.textContent || '').includes(label))
                .filter(el => !Array.from(el.children).some(c => (c.textContent || '').includes(label)));
            if (hits.length === 0) return false;
            hits[0].scrollIntoView({{block: 'center'}});
            hits[0].click();
            return true;
        }}"
    )
}

/// Absolute URL of the iframe document
fn resolve_frame_src(page_url: &str, src: &str) -> Result<String, AutomationError> {
    if let Ok(absolute) = Url::parse(src) {
        return Ok(absolute.to_string());
    }
    Url::parse(page_url)
        .and_then(|base| base.join(src))
        .map(|u| u.to_string())
        .map_err(|_| AutomationError::IframeMissing)
}
