//! Background execution of submissions for the UI thread

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{ReplyRequest, ReplySubmitter};
use crate::ui::{AppEvent, AppEventSender};

/// Runs [`ReplySubmitter::submit`] on the tokio runtime
///
/// Every spawned run reports back with exactly one
/// [`AppEvent::SubmissionFinished`]. The semaphore bounds how many browser
/// sessions exist at once.
pub struct SubmissionRunner {
    handle: Handle,
    submitter: Arc<dyn ReplySubmitter>,
    permits: Arc<Semaphore>,
    events: AppEventSender,
}

impl SubmissionRunner {
    pub fn new(
        handle: Handle,
        submitter: Arc<dyn ReplySubmitter>,
        max_concurrent_sessions: usize,
        events: AppEventSender,
    ) -> Self {
        Self {
            handle,
            submitter,
            permits: Arc::new(Semaphore::new(max_concurrent_sessions.max(1))),
            events,
        }
    }

    pub fn spawn(&self, index: usize, request: ReplyRequest) -> JoinHandle<()> {
        let submitter = Arc::clone(&self.submitter);
        let permits = Arc::clone(&self.permits);
        let events = self.events.clone();

        self.handle.spawn(async move {
            let outcome = match permits.acquire_owned().await {
                Ok(_permit) => {
                    info!("Submitting reply for review {} ({})", index, request.author);
                    submitter.submit(&request).await.map_err(|e| e.to_string())
                }
                Err(_) => Err("submission queue closed".to_string()),
            };

            debug!("Submission {} finished (ok={})", index, outcome.is_ok());
            events.send(AppEvent::SubmissionFinished { index, outcome });
        })
    }
}
