//! Terminal review browser
//!
//! The UI thread owns [`App`] and blocks on a single `std::sync::mpsc`
//! channel. Terminal input arrives from a dedicated reader thread and
//! submission results from tokio tasks, both as [`AppEvent`]s.

mod app;
mod event;
mod pager;
mod render;

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::execute;
use tracing::{info, warn};

pub use app::{Action, App, Mode, SubmissionStatus};
pub use event::{AppEvent, AppEventSender};
pub use pager::Pager;

use crate::automation::SubmissionRunner;

const INPUT_POLL: Duration = Duration::from_millis(250);

/// Run the browser until the user quits
///
/// Submissions still in flight at exit are abandoned with the runtime.
pub fn run(
    mut app: App,
    runner: &SubmissionRunner,
    events: Receiver<AppEvent>,
    sender: AppEventSender,
) -> io::Result<()> {
    let mut terminal = ratatui::init();
    if let Err(e) = execute!(io::stdout(), EnableBracketedPaste) {
        warn!("Bracketed paste unavailable: {}", e);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let input = spawn_input_thread(sender, Arc::clone(&stop));

    let result = (|| -> io::Result<()> {
        loop {
            terminal.draw(|frame| render::draw(frame, &app))?;

            let Ok(event) = events.recv() else {
                return Ok(());
            };
            let action = match event {
                AppEvent::Terminal(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    app.handle_key(key)
                }
                AppEvent::Terminal(Event::Paste(text)) => {
                    app.paste(&text);
                    Action::None
                }
                AppEvent::Terminal(_) => Action::None,
                AppEvent::SubmissionFinished { index, outcome } => {
                    app.on_submission_finished(index, outcome);
                    Action::None
                }
            };

            match action {
                Action::None => {}
                Action::Quit => return Ok(()),
                Action::Submit { index, request } => {
                    runner.spawn(index, request);
                }
                Action::OpenUrl(url) => {
                    if let Err(e) = open::that_detached(&url) {
                        warn!("Failed to open {}: {}", url, e);
                        app.set_status_line(format!("Could not open {url}: {e}"));
                    }
                }
            }
        }
    })();

    stop.store(true, Ordering::Relaxed);
    let _ = execute!(io::stdout(), DisableBracketedPaste);
    ratatui::restore();
    if input.join().is_err() {
        warn!("Input thread panicked");
    }

    let in_flight = app.in_flight_count();
    if in_flight > 0 {
        warn!("Exiting with {} submissions still running", in_flight);
    }
    info!("Review browser closed");
    result
}

fn spawn_input_thread(sender: AppEventSender, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            match crossterm::event::poll(INPUT_POLL) {
                Ok(true) => match crossterm::event::read() {
                    Ok(event) => sender.send(AppEvent::Terminal(event)),
                    Err(e) => {
                        warn!("Terminal read failed: {}", e);
                        return;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    warn!("Terminal poll failed: {}", e);
                    return;
                }
            }
        }
    })
}
