//! Reply submission through browser automation
//!
//! The UI only sees [`ReplySubmitter`]; [`GoogleReviewsAdapter`] is the
//! production implementation driving Chrome over CDP.

mod config;
mod google;
pub mod matcher;
mod runner;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use config::{AutomationConfig, AutomationTimeouts, PlatformSelectors};
pub use google::GoogleReviewsAdapter;
pub use runner::SubmissionRunner;

use crate::browser::BrowserError;
use crate::utils::ConfigError;

/// Why a submission run was aborted
#[derive(Error, Debug)]
pub enum AutomationError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Timed out after {timeout_ms}ms waiting for '{selector}'")]
    ElementTimeout { selector: String, timeout_ms: u64 },

    #[error("Element '{selector}' not found: {reason}")]
    ElementNotFound { selector: String, reason: String },

    #[error("Reviews did not load after sorting by newest")]
    ReviewsNotLoaded,

    #[error("No review by '{author}' found on the page")]
    ReviewNotFound { author: String },

    #[error("{count} review(s) by '{author}' on the page, none matching the review text or date")]
    NoMatchingReview { author: String, count: usize },

    #[error("{count} reviews by '{author}' match; refusing to guess")]
    AmbiguousAuthor { author: String, count: usize },

    #[error("Reply control '{label}' not found in the review by '{author}'")]
    ReplyControlMissing { author: String, label: String },

    #[error("Reply iframe has no document source")]
    IframeMissing,

    #[error("Missing permalink for review by '{author}'")]
    MissingPermalink { author: String },
}

/// Everything needed to post one reply
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyRequest {
    pub permalink: String,
    pub author: String,
    pub text: String,
    /// Part of the review body, used to tell apart reviews by the same author
    pub review_snippet: Option<String>,
    /// When the review was posted; checked against the date shown on the page
    pub posted_at: Option<DateTime<Utc>>,
}

/// Confirmation of a posted reply
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    pub author: String,
    pub reply_chars: usize,
}

/// A platform adapter that can post an owner reply
#[async_trait]
pub trait ReplySubmitter: Send + Sync {
    async fn submit(&self, request: &ReplyRequest) -> Result<SubmissionReceipt, AutomationError>;
}
