//! Review browser state
//!
//! Owned by the UI thread. Key handling returns an [`Action`] for the run
//! loop to carry out, which keeps this module free of terminal and runtime
//! handles.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{error, info, warn};

use super::pager::Pager;
use crate::automation::matcher::snippet_of;
use crate::automation::{ReplyRequest, SubmissionReceipt};
use crate::drafter::DraftBook;
use crate::store::{Review, ReviewStore, is_missing_text};
use crate::utils::constants::PAGE_SIZE;

const SNIPPET_CHARS: usize = 80;

/// Per-review submission state; survives paging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    InFlight,
    Answered,
    Failed(String),
    /// The export already carried an owner answer
    AlreadyAnswered,
}

impl SubmissionStatus {
    pub fn label(&self) -> String {
        match self {
            Self::Idle => "Not sent".to_string(),
            Self::InFlight => "Sending...".to_string(),
            Self::Answered => "Answered".to_string(),
            Self::Failed(reason) => format!("Failed: {reason}"),
            Self::AlreadyAnswered => "Already answered".to_string(),
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::Answered | Self::AlreadyAnswered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Edit,
}

/// Side effect requested by a key press
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Submit { index: usize, request: ReplyRequest },
    OpenUrl(String),
}

pub struct App {
    store: ReviewStore,
    drafts: DraftBook,
    pager: Pager,
    slot: usize,
    mode: Mode,
    statuses: Vec<SubmissionStatus>,
    /// Text handed to the submitter, written back on success
    submitted: HashMap<usize, String>,
    status_line: String,
}

impl App {
    pub fn new(store: ReviewStore, drafts: DraftBook) -> Self {
        let table = store.table();
        let statuses = table
            .iter()
            .map(|r| {
                if r.is_answered() {
                    SubmissionStatus::AlreadyAnswered
                } else {
                    SubmissionStatus::Idle
                }
            })
            .collect();
        let mut drafts = drafts;
        if drafts.len() != table.len() {
            warn!(
                "Draft count {} does not match {} reviews; starting empty",
                drafts.len(),
                table.len()
            );
            drafts = DraftBook::empty(table.len());
        }
        let status_line = format!("Loaded {}", store.path().display());

        Self {
            pager: Pager::new(table.len()),
            store,
            drafts,
            slot: 0,
            mode: Mode::Browse,
            statuses,
            submitted: HashMap::new(),
            status_line,
        }
    }

    pub fn store(&self) -> &ReviewStore {
        &self.store
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn selected_slot(&self) -> usize {
        self.slot
    }

    pub fn status_line(&self) -> &str {
        &self.status_line
    }

    pub fn review(&self, index: usize) -> Option<&Review> {
        self.store.table().get(index)
    }

    pub fn draft(&self, index: usize) -> &str {
        self.drafts.get(index).unwrap_or_default()
    }

    pub fn status(&self, index: usize) -> &SubmissionStatus {
        self.statuses
            .get(index)
            .unwrap_or(&SubmissionStatus::Idle)
    }

    pub fn in_flight_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == SubmissionStatus::InFlight)
            .count()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.pager.index_for_slot(self.slot)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.kind == KeyEventKind::Release {
            return Action::None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.mode {
            Mode::Edit => {
                self.edit_key(key);
                Action::None
            }
            Mode::Browse => self.browse_key(key),
        }
    }

    fn browse_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Left | KeyCode::Char('p') => {
                if self.pager.prev() {
                    self.slot = 0;
                }
                Action::None
            }
            KeyCode::Right | KeyCode::Char('n') => {
                if self.pager.next() {
                    self.slot = 0;
                }
                Action::None
            }
            KeyCode::Up => {
                self.slot = self.slot.saturating_sub(1);
                Action::None
            }
            KeyCode::Down => {
                if self.slot + 1 < self.pager.visible() {
                    self.slot += 1;
                }
                Action::None
            }
            KeyCode::Char(c @ '1'..='3') => {
                let slot = (c as usize) - ('1' as usize);
                if slot < self.pager.visible().min(PAGE_SIZE) {
                    self.slot = slot;
                }
                Action::None
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.start_editing();
                Action::None
            }
            KeyCode::Char('r') => self.respond(),
            KeyCode::Char('o') => {
                let link = self.selected_index().and_then(|i| self.review(i)).and_then(|r| {
                    r.review_link.clone().or_else(|| r.reviews_link.clone())
                });
                self.open_or_report(link)
            }
            KeyCode::Char('O') => {
                let link = self.store.table().business().reviews_link.clone();
                self.open_or_report(link)
            }
            _ => Action::None,
        }
    }

    fn edit_key(&mut self, key: KeyEvent) {
        let Some(index) = self.selected_index() else {
            self.mode = Mode::Browse;
            return;
        };
        let Some(draft) = self.drafts.get_mut(index) else {
            self.mode = Mode::Browse;
            return;
        };

        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                self.status_line = format!("Draft {} saved", index + 1);
            }
            KeyCode::Backspace => {
                draft.pop();
            }
            KeyCode::Enter => draft.push('\n'),
            KeyCode::Tab => draft.push(' '),
            KeyCode::Char(c) => draft.push(c),
            _ => {}
        }
    }

    /// Append pasted text to the draft being edited
    pub fn paste(&mut self, text: &str) {
        if self.mode != Mode::Edit {
            return;
        }
        if let Some(draft) = self.selected_index().and_then(|i| self.drafts.get_mut(i)) {
            draft.push_str(text);
        }
    }

    fn start_editing(&mut self) {
        let Some(index) = self.selected_index() else {
            return;
        };
        match self.status(index).clone() {
            SubmissionStatus::InFlight => {
                self.status_line = "Reply is being submitted; editing disabled".to_string();
            }
            status if status.is_final() => {
                self.status_line = "Review already answered".to_string();
            }
            _ => {
                self.mode = Mode::Edit;
                self.status_line = "Editing draft (Esc to finish)".to_string();
            }
        }
    }

    /// Start a submission for the selected review, if it is eligible
    pub fn respond(&mut self) -> Action {
        let Some(index) = self.selected_index() else {
            return Action::None;
        };
        let status = self.status(index);
        if *status == SubmissionStatus::InFlight || status.is_final() {
            return Action::None;
        }
        let draft = self.draft(index).trim().to_string();
        if draft.is_empty() {
            self.status_line = "Draft is empty; nothing to send".to_string();
            return Action::None;
        }
        let Some(review) = self.review(index).cloned() else {
            return Action::None;
        };
        let Some(permalink) = review.permalink().map(str::to_string) else {
            self.status_line = format!("No link for review by {}", review.author);
            return Action::None;
        };

        let request = ReplyRequest {
            permalink,
            author: review.author.clone(),
            text: draft.clone(),
            review_snippet: snippet_of(&review.text, SNIPPET_CHARS)
                .filter(|s| !is_missing_text(s)),
            posted_at: review.timestamp,
        };

        info!("Queued reply for review {} ({})", index, review.author);
        self.status_line = format!("Submitting reply to {}...", review.author);
        self.statuses[index] = SubmissionStatus::InFlight;
        self.submitted.insert(index, draft);
        Action::Submit { index, request }
    }

    /// Apply the result of a background submission
    pub fn on_submission_finished(&mut self, index: usize, outcome: Result<SubmissionReceipt, String>) {
        let Some(status) = self.statuses.get_mut(index) else {
            warn!("Submission result for unknown review {}", index);
            return;
        };
        let submitted = self.submitted.remove(&index);

        match outcome {
            Ok(receipt) => {
                *status = SubmissionStatus::Answered;
                let reply = submitted.unwrap_or_else(|| self.draft(index).to_string());
                self.status_line = match self.store.write_back(index, &reply) {
                    Ok(_) => format!("Reply to {} posted and saved", receipt.author),
                    Err(e) => {
                        error!("Write-back for review {} failed: {}", index, e);
                        format!("Reply to {} posted but saving failed: {e}", receipt.author)
                    }
                };
            }
            Err(reason) => {
                *status = SubmissionStatus::Failed(reason.clone());
                self.status_line = format!("Submission failed: {reason}");
            }
        }
    }

    fn open_or_report(&mut self, link: Option<String>) -> Action {
        match link {
            Some(url) => Action::OpenUrl(url),
            None => {
                self.status_line = "No link available".to_string();
                Action::None
            }
        }
    }

    pub fn set_status_line(&mut self, text: impl Into<String>) {
        self.status_line = text.into();
    }
}
