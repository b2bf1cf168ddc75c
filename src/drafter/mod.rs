//! Response drafter
//!
//! Turns a review into an owner reply by prompting a completion service.
//! Failures are retried with exponential backoff and finally replaced by a
//! fixed fallback string; callers never see an error.

mod client;
mod config;
pub mod prompt;

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use tracing::{error, info};

pub use client::{ChatMessage, CompletionClient, CompletionError, CompletionRequest, OpenAiClient};
pub use config::DrafterConfig;
pub use prompt::{FALLBACK_RESPONSE, REVIEW_PLACEHOLDER, SYSTEM_PROMPT};

use crate::store::ReviewTable;

/// Draft replies, one slot per review index
///
/// Lives apart from the review table: drafts are never persisted until a
/// submission succeeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftBook {
    drafts: Vec<String>,
}

impl DraftBook {
    /// One empty draft per review
    pub fn empty(len: usize) -> Self {
        Self {
            drafts: vec![String::new(); len],
        }
    }

    pub fn from_drafts(drafts: Vec<String>) -> Self {
        Self { drafts }
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.drafts.get(index).map(String::as_str)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut String> {
        self.drafts.get_mut(index)
    }

    pub fn set(&mut self, index: usize, text: impl Into<String>) {
        if let Some(slot) = self.drafts.get_mut(index) {
            *slot = text.into();
        }
    }
}

/// Completion-backed reply drafter
pub struct Drafter {
    client: Arc<dyn CompletionClient>,
    config: DrafterConfig,
}

impl Drafter {
    pub fn new(client: Arc<dyn CompletionClient>, config: DrafterConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &DrafterConfig {
        &self.config
    }

    /// Build the completion request for one review
    pub fn request_for(&self, author: &str, review_text: &str, examples: &str) -> CompletionRequest {
        let text = prompt::prepare_review_text(review_text, self.config.truncate_chars);
        CompletionRequest {
            messages: prompt::build_messages(author, &text, examples),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Draft a reply, retrying with backoff; falls back to [`FALLBACK_RESPONSE`]
    pub async fn draft(&self, author: &str, review_text: &str, examples: &str) -> String {
        let request = self.request_for(author, review_text, examples);

        for attempt in 0..self.config.max_retries {
            match self.client.complete(&request).await {
                Ok(reply) => return reply.trim().to_string(),
                Err(e) => {
                    error!(
                        "Error generating AI response for '{}' (attempt {}): {}",
                        prompt::author_or_default(author),
                        attempt + 1,
                        e
                    );
                    if attempt + 1 < self.config.max_retries {
                        tokio::time::sleep(self.config.backoff(attempt)).await;
                    }
                }
            }
        }

        FALLBACK_RESPONSE.to_string()
    }

    /// Draft every unanswered review in table order
    ///
    /// Answered reviews keep their existing owner answer as the draft and
    /// never reach the completion service.
    pub async fn draft_all(&self, table: &ReviewTable) -> DraftBook {
        let examples = prompt::build_examples(table.reviews(), self.config.max_examples);
        let pending = table.iter().filter(|r| !r.is_answered()).count();
        info!(
            "Drafting {} of {} reviews ({} bytes of examples)",
            pending,
            table.len(),
            examples.len()
        );

        let examples = examples.as_str();
        let drafts: Vec<String> = stream::iter(table.iter().enumerate())
            .map(|(index, review)| async move {
                match review.owner_answer.as_deref() {
                    Some(answer) => answer.to_string(),
                    None => {
                        let draft = self.draft(&review.author, &review.text, examples).await;
                        info!("Drafted reply for review {} ({})", index, review.author);
                        draft
                    }
                }
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        DraftBook::from_drafts(drafts)
    }
}
