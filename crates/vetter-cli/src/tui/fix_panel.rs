//! Modal taxonomy search for picking a corrected code.
//!
//! Keys: type to search, Up/Down move over selectable rows, Tab toggles
//! Division/Group context rows, Enter submits the row under the cursor,
//! F1-F9 submit visible row 1-9, Esc closes without submitting.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use vetter_core::session::{FixSearch, Outcome, ReviewSession};

use super::with_cursor;

/// What a key did to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelEvent {
    /// The key edited the query or moved the cursor.
    Updated,
    /// A code was submitted; the panel is gone.
    Submitted,
    /// Nothing selectable under the cursor.
    NothingSelected,
    /// The panel was closed without submitting.
    Closed,
    Unhandled,
}

pub fn handle_key(session: &mut ReviewSession, key: KeyEvent) -> PanelEvent {
    let Some(query) = session
        .review()
        .and_then(|review| review.fix())
        .map(|fix| fix.query().to_string())
    else {
        return PanelEvent::Unhandled;
    };

    match key.code {
        KeyCode::Esc => {
            session.cancel_fix();
            PanelEvent::Closed
        }
        KeyCode::Enter => submitted(session.select_fix()),
        KeyCode::F(n @ 1..=9) => submitted(session.select_fix_at(usize::from(n - 1))),
        KeyCode::Down => {
            session.fix_next();
            PanelEvent::Updated
        }
        KeyCode::Up => {
            session.fix_prev();
            PanelEvent::Updated
        }
        KeyCode::Tab => {
            session.toggle_fix_context();
            PanelEvent::Updated
        }
        KeyCode::Backspace => {
            let mut next = query;
            next.pop();
            session.set_fix_query(&next);
            PanelEvent::Updated
        }
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            let mut next = query;
            next.push(c);
            session.set_fix_query(&next);
            PanelEvent::Updated
        }
        _ => PanelEvent::Unhandled,
    }
}

fn submitted(outcome: Outcome) -> PanelEvent {
    match outcome {
        Outcome::Submitting => PanelEvent::Submitted,
        Outcome::FixOpened | Outcome::Ignored(_) => PanelEvent::NothingSelected,
    }
}

pub fn render(frame: &mut ratatui::Frame<'_>, fix: &FixSearch, area: Rect) {
    let modal_width = area.width.saturating_sub(4).min(90);
    let modal_height = area.height.saturating_sub(4).min(24);
    let x = area.x + area.width.saturating_sub(modal_width) / 2;
    let y = area.y + area.height.saturating_sub(modal_height) / 2;
    let modal_area = Rect::new(x, y, modal_width, modal_height);

    frame.render_widget(Clear, modal_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(modal_area);

    let query_block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::Green))
        .title(" Fix code --- type to search ")
        .title_style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    let query = with_cursor(fix.query(), fix.query().chars().count());
    frame.render_widget(Paragraph::new(query).block(query_block), chunks[0]);

    let results_block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(" Results ({}) ", fix.results().visible().len()));
    frame.render_widget(
        Paragraph::new(result_lines(fix))
            .block(results_block)
            .wrap(Wrap { trim: false }),
        chunks[1],
    );

    frame.render_widget(Paragraph::new(footer_line(fix)), chunks[2]);
}

fn result_lines(fix: &FixSearch) -> Vec<Line<'static>> {
    if let Some(err) = fix.error() {
        return vec![Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        ))];
    }
    let results = fix.results();
    if results.is_empty() && !fix.is_loading() {
        return vec![Line::from(Span::styled(
            "No matches",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let cursor = results.cursor();
    results
        .visible()
        .into_iter()
        .enumerate()
        .map(|(idx, entry)| {
            let level = entry.level.map_or("?", |l| l.label());
            if !entry.is_selectable() {
                return Line::from(Span::styled(
                    format!("     {:<10} {:<9} {}", entry.code(), level, entry.classification.title),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ));
            }
            let selected = cursor == Some(idx);
            let marker = if selected { "▶" } else { " " };
            let hotkey = if idx < 9 {
                format!("F{}", idx + 1)
            } else {
                "  ".to_string()
            };
            let style = if selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Green)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{marker}{hotkey:<3} "), Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{:<10} {:<9} {}", entry.code(), level, entry.classification.title),
                    style,
                ),
            ])
        })
        .collect()
}

fn footer_line(fix: &FixSearch) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " Enter submit  Esc cancel  Tab context ",
        Style::default().fg(Color::DarkGray),
    )];
    if fix.is_loading() {
        spans.push(Span::styled(" searching…", Style::default().fg(Color::Yellow)));
    }
    let hidden = fix.results().hidden();
    if hidden > 0 {
        spans.push(Span::styled(
            format!(" {hidden} broader hidden"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}
