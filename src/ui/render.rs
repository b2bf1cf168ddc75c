use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Paragraph, Wrap};

use super::app::{App, Mode, SubmissionStatus};
use crate::store::Review;
use crate::utils::constants::PAGE_SIZE;

const KEY_HINTS: &str =
    "←/p prev  →/n next  1-3 select  e edit  r respond  o open review  O open listing  q quit";

pub fn draw(frame: &mut Frame, app: &App) {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(PAGE_SIZE as u16 * 4),
        Constraint::Length(2),
    ])
    .areas(frame.area());

    draw_header(frame, header, app);

    let slots = Layout::vertical([Constraint::Ratio(1, PAGE_SIZE as u32); PAGE_SIZE]).split(body);
    for (slot, area) in slots.iter().enumerate() {
        match app.pager().index_for_slot(slot) {
            Some(index) => draw_slot(frame, *area, app, slot, index),
            None => frame.render_widget(Block::bordered().dim(), *area),
        }
    }

    draw_footer(frame, footer, app);
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let business = app.store().table().business();
    let pager = app.pager();
    let line = Line::from(vec![
        Span::from(business.name.as_str()).bold(),
        Span::from(format!(
            "  {} reviews  rating {}",
            business.total_reviews, business.rating
        )),
        Span::from(format!(
            "  page {}/{}",
            pager.page() + 1,
            pager.page_count()
        ))
        .dim(),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::bordered().title(" Review Responder ")),
        area,
    );
}

fn draw_slot(frame: &mut Frame, area: Rect, app: &App, slot: usize, index: usize) {
    let Some(review) = app.review(index) else {
        return;
    };
    let selected = app.selected_slot() == slot;
    let editing = selected && app.mode() == Mode::Edit;

    let border = if editing {
        Style::default().fg(Color::Yellow)
    } else if selected {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let title = format!(
        " {}. {}  {}  {} ",
        slot + 1,
        review.author,
        stars(review.rating),
        date_label(review)
    );
    let status = app.status(index);

    let mut draft = app.draft(index).to_string();
    if editing {
        draft.push('▏');
    }

    let mut text = Text::default();
    text.lines.push(Line::from(review.text.clone()));
    text.lines.push(Line::default());
    text.lines.push(Line::from(Span::from("Reply:").bold()));
    for line in draft.split('\n') {
        text.lines.push(Line::from(line.to_string()));
    }

    let link = if review.permalink().is_some() {
        "link ✓"
    } else {
        "no link"
    };
    let block = Block::bordered()
        .border_style(border)
        .title(title)
        .title_bottom(Line::from(vec![
            Span::styled(format!(" {} ", status.label()), status_style(status)),
            Span::from(format!(" {link} ")).dim(),
        ]));

    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }).block(block),
        area,
    );
}

fn draw_footer(frame: &mut Frame, area: Rect, app: &App) {
    let hints = match app.mode() {
        Mode::Edit => "Editing: type to change the reply, Enter for newline, Esc to finish",
        Mode::Browse => KEY_HINTS,
    };
    let text = Text::from(vec![
        Line::from(app.status_line().to_string()),
        Line::from(hints).dim(),
    ]);
    frame.render_widget(Paragraph::new(text), area);
}

fn status_style(status: &SubmissionStatus) -> Style {
    match status {
        SubmissionStatus::Idle => Style::default(),
        SubmissionStatus::InFlight => Style::default().fg(Color::Yellow),
        SubmissionStatus::Answered | SubmissionStatus::AlreadyAnswered => {
            Style::default().fg(Color::Green)
        }
        SubmissionStatus::Failed(_) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn stars(rating: Option<f64>) -> String {
    match rating {
        Some(r) => {
            let filled = r.round().clamp(0.0, 5.0) as usize;
            format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
        }
        None => "no rating".to_string(),
    }
}

fn date_label(review: &Review) -> String {
    match review.timestamp {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => review.timestamp_raw.clone(),
    }
}
