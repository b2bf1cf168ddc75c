use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::{ConfigError, validate_interaction_timeout, validate_navigation_timeout};

/// Browser automation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationConfig {
    #[serde(default)]
    pub timeouts: AutomationTimeouts,

    /// Pause before clicking the sort control
    #[serde(default = "default_pre_sort_delay_ms")]
    pub pre_sort_delay_ms: u64,

    /// Pause after sorting while the list re-renders
    #[serde(default = "default_post_sort_delay_ms")]
    pub post_sort_delay_ms: u64,

    /// Pause after clicking submit before the browser is torn down
    #[serde(default = "default_post_submit_delay_ms")]
    pub post_submit_delay_ms: u64,

    #[serde(default = "default_scroll_iterations")]
    pub scroll_iterations: u32,

    #[serde(default = "default_scroll_pause_ms")]
    pub scroll_pause_ms: u64,

    /// Browser runs allowed at once; more than one needs separate profiles
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,

    #[serde(default)]
    pub selectors: PlatformSelectors,
}

/// Wait ceilings in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationTimeouts {
    #[serde(default = "default_navigation_ms")]
    pub navigation_ms: u64,

    #[serde(default = "default_sort_ms")]
    pub sort_ms: u64,

    #[serde(default = "default_reviews_panel_ms")]
    pub reviews_panel_ms: u64,

    #[serde(default = "default_iframe_ms")]
    pub iframe_ms: u64,

    #[serde(default = "default_submit_ms")]
    pub submit_ms: u64,
}

/// CSS selectors and labels for the review platform's markup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSelectors {
    #[serde(default = "default_sort_newest")]
    pub sort_newest: String,

    #[serde(default = "default_reviews_panel")]
    pub reviews_panel: String,

    #[serde(default = "default_scroll_container")]
    pub scroll_container: String,

    #[serde(default = "default_review_block")]
    pub review_block: String,

    #[serde(default = "default_author_anchor")]
    pub author_anchor: String,

    /// Relative date label inside a review block ("hace 2 semanas")
    #[serde(default = "default_review_date")]
    pub review_date: String,

    /// Visible text of the reply control inside a review block
    #[serde(default = "default_reply_label")]
    pub reply_label: String,

    #[serde(default = "default_reply_iframe")]
    pub reply_iframe: String,

    #[serde(default = "default_reply_textarea")]
    pub reply_textarea: String,

    #[serde(default = "default_submit_button")]
    pub submit_button: String,
}

fn default_pre_sort_delay_ms() -> u64 {
    5_000
}
fn default_post_sort_delay_ms() -> u64 {
    10_000
}
fn default_post_submit_delay_ms() -> u64 {
    3_000
}
fn default_scroll_iterations() -> u32 {
    10
}
fn default_scroll_pause_ms() -> u64 {
    3_000
}
fn default_max_concurrent_sessions() -> usize {
    1
}

fn default_navigation_ms() -> u64 {
    30_000
}
fn default_sort_ms() -> u64 {
    30_000
}
fn default_reviews_panel_ms() -> u64 {
    20_000
}
fn default_iframe_ms() -> u64 {
    60_000
}
fn default_submit_ms() -> u64 {
    10_000
}

fn default_sort_newest() -> String {
    r#"div[data-sort-id="newestFirst"]"#.to_string()
}
fn default_reviews_panel() -> String {
    "div.gws-localreviews__general-reviews-block".to_string()
}
fn default_scroll_container() -> String {
    ".review-dialog-list".to_string()
}
fn default_review_block() -> String {
    "div.gws-localreviews__google-review".to_string()
}
fn default_author_anchor() -> String {
    r#"a[href*="google.com/maps/contrib/"]"#.to_string()
}
fn default_review_date() -> String {
    "span.dehysf".to_string()
}
fn default_reply_label() -> String {
    "Responder".to_string()
}
fn default_reply_iframe() -> String {
    r#"iframe[src*="/local/business"]"#.to_string()
}
fn default_reply_textarea() -> String {
    r#"textarea[aria-label="Tu respuesta pública"]"#.to_string()
}
fn default_submit_button() -> String {
    "button.VfPpkd-LgbsSe.VfPpkd-LgbsSe-OWXEXe-k8QpJ.VfPpkd-LgbsSe-OWXEXe-dgl2Hf.nCP5yc.AjY5Oe.DuMIQc.LQeN7.FwaX8"
        .to_string()
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            timeouts: AutomationTimeouts::default(),
            pre_sort_delay_ms: default_pre_sort_delay_ms(),
            post_sort_delay_ms: default_post_sort_delay_ms(),
            post_submit_delay_ms: default_post_submit_delay_ms(),
            scroll_iterations: default_scroll_iterations(),
            scroll_pause_ms: default_scroll_pause_ms(),
            max_concurrent_sessions: default_max_concurrent_sessions(),
            selectors: PlatformSelectors::default(),
        }
    }
}

impl Default for AutomationTimeouts {
    fn default() -> Self {
        Self {
            navigation_ms: default_navigation_ms(),
            sort_ms: default_sort_ms(),
            reviews_panel_ms: default_reviews_panel_ms(),
            iframe_ms: default_iframe_ms(),
            submit_ms: default_submit_ms(),
        }
    }
}

impl Default for PlatformSelectors {
    fn default() -> Self {
        Self {
            sort_newest: default_sort_newest(),
            reviews_panel: default_reviews_panel(),
            scroll_container: default_scroll_container(),
            review_block: default_review_block(),
            author_anchor: default_author_anchor(),
            review_date: default_review_date(),
            reply_label: default_reply_label(),
            reply_iframe: default_reply_iframe(),
            reply_textarea: default_reply_textarea(),
            submit_button: default_submit_button(),
        }
    }
}

/// Timeouts after range checks
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ResolvedTimeouts {
    pub navigation: Duration,
    pub sort: Duration,
    pub reviews_panel: Duration,
    pub iframe: Duration,
    pub submit: Duration,
}

impl AutomationTimeouts {
    /// Page loads, panel rendering and the iframe are navigation-class waits;
    /// clicks are interaction-class
    pub(crate) fn resolve(&self) -> Result<ResolvedTimeouts, ConfigError> {
        Ok(ResolvedTimeouts {
            navigation: validate_navigation_timeout("automation.timeouts.navigation_ms", self.navigation_ms)?,
            sort: validate_interaction_timeout("automation.timeouts.sort_ms", self.sort_ms)?,
            reviews_panel: validate_navigation_timeout(
                "automation.timeouts.reviews_panel_ms",
                self.reviews_panel_ms,
            )?,
            iframe: validate_navigation_timeout("automation.timeouts.iframe_ms", self.iframe_ms)?,
            submit: validate_interaction_timeout("automation.timeouts.submit_ms", self.submit_ms)?,
        })
    }
}

impl AutomationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timeouts.resolve()?;
        if self.max_concurrent_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                name: "automation.max_concurrent_sessions",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.selectors.reply_label.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "automation.selectors.reply_label",
                reason: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn pre_sort_delay(&self) -> Duration {
        Duration::from_millis(self.pre_sort_delay_ms)
    }

    pub fn post_sort_delay(&self) -> Duration {
        Duration::from_millis(self.post_sort_delay_ms)
    }

    pub fn post_submit_delay(&self) -> Duration {
        Duration::from_millis(self.post_submit_delay_ms)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }
}
