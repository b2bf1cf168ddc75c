use std::sync::mpsc::Sender;

use crossterm::event::Event;

use crate::automation::SubmissionReceipt;

/// Everything the UI thread reacts to
#[derive(Debug)]
pub enum AppEvent {
    /// Key press, resize, paste from the input thread
    Terminal(Event),

    /// A background submission ended; the error is already formatted for display
    SubmissionFinished {
        index: usize,
        outcome: Result<SubmissionReceipt, String>,
    },
}

/// Cloneable handle background work uses to reach the UI thread
#[derive(Clone, Debug)]
pub struct AppEventSender {
    tx: Sender<AppEvent>,
}

impl AppEventSender {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Send an event; if the UI has already gone away the error is logged and dropped
    pub fn send(&self, event: AppEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!("failed to send app event: {e}");
        }
    }
}
