//! Full-screen review view.
//!
//! Layout, top to bottom: a header with reviewer, progress and the decision
//! timer; the item with both candidate codes and their hierarchies; the
//! action bar listing the keys legal for the current item; a status line.
//! The fix search and text prompts draw as modals on top.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::time::{Duration, Instant};
use vetter_core::conflict::ReviewMode;
use vetter_core::hierarchy::HierarchyEntry;
use vetter_core::model::Item;
use vetter_core::router::{self, Command, RouteContext};
use vetter_core::session::{
    Action, Ignored, Notice, NoticeLevel, Outcome, Phase, Review, ReviewSession,
};
use vetter_core::timer::format_clock;

use super::fix_panel::{self, PanelEvent};
use super::keys::{is_interrupt, key_char};
use super::with_cursor;

const STATUS_TTL: Duration = Duration::from_secs(5);
const DETAIL_LINES: usize = 2;

/// Text prompts that own the keyboard until Enter or Esc.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prompt {
    EscalationReason(String),
    Reviewer(String),
    DailyTarget(String),
}

impl Prompt {
    const fn title(&self) -> &'static str {
        match self {
            Self::EscalationReason(_) => " Escalate --- reason (optional) ",
            Self::Reviewer(_) => " Reviewer name ",
            Self::DailyTarget(_) => " Daily target ",
        }
    }

    fn buffer_mut(&mut self) -> &mut String {
        match self {
            Self::EscalationReason(buf) | Self::Reviewer(buf) | Self::DailyTarget(buf) => buf,
        }
    }

    fn buffer(&self) -> &str {
        match self {
            Self::EscalationReason(buf) | Self::Reviewer(buf) | Self::DailyTarget(buf) => buf,
        }
    }
}

pub struct ReviewView {
    session: ReviewSession,
    prompt: Option<Prompt>,
    status_msg: Option<(String, NoticeLevel, Instant)>,
    should_quit: bool,
}

impl ReviewView {
    pub const fn new(session: ReviewSession) -> Self {
        Self {
            session,
            prompt: None,
            status_msg: None,
            should_quit: false,
        }
    }

    pub const fn session(&self) -> &ReviewSession {
        &self.session
    }

    pub fn into_session(self) -> ReviewSession {
        self.session
    }

    pub fn set_status(&mut self, msg: String) {
        self.status_msg = Some((msg, NoticeLevel::Info, Instant::now()));
    }

    fn set_notice(&mut self, notice: Notice) {
        let msg = match notice.code {
            Some(code) => format!("[{code}] {}", notice.message),
            None => notice.message,
        };
        self.status_msg = Some((msg, notice.level, Instant::now()));
    }

    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn fix_open(&self) -> bool {
        self.session
            .review()
            .is_some_and(|review| review.fix().is_some())
    }

    /// Apply finished remote calls and surface new notices.
    pub fn tick(&mut self) -> Result<()> {
        self.session.poll();
        for notice in self.session.take_notices() {
            self.set_notice(notice);
        }
        if self
            .status_msg
            .as_ref()
            .is_some_and(|(_, level, at)| *level == NoticeLevel::Info && at.elapsed() >= STATUS_TTL)
        {
            self.status_msg = None;
        }
        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if is_interrupt(&key) {
            self.should_quit = true;
            return Ok(());
        }
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return Ok(());
        }
        if self.fix_open() {
            match fix_panel::handle_key(&mut self.session, key) {
                PanelEvent::Submitted => self.set_status("Submitting fix…".to_string()),
                PanelEvent::NothingSelected => {
                    self.set_status("Select a Class-level code to submit".to_string());
                }
                PanelEvent::Closed | PanelEvent::Updated | PanelEvent::Unhandled => {}
            }
            return Ok(());
        }

        let Some(c) = key_char(&key) else {
            return Ok(());
        };
        if self.handle_session_key(c) {
            return Ok(());
        }

        let candidates = self.session.review().map(Review::candidates);
        let ctx = RouteContext {
            candidates,
            input_captured: false,
        };
        match router::route(c, ctx) {
            Some(Command::Quit) => self.should_quit = true,
            Some(Command::Dispatch(Action::Escalate { .. })) => {
                if self.session.is_processing() {
                    self.set_status("Still submitting…".to_string());
                } else {
                    self.prompt = Some(Prompt::EscalationReason(String::new()));
                }
            }
            Some(Command::Dispatch(action)) => {
                let outcome = self.session.dispatch(action);
                self.report(outcome);
            }
            Some(Command::TogglePause) => {
                if let Some(paused) = self.session.toggle_pause() {
                    let msg = if paused { "Timer paused" } else { "Timer resumed" };
                    self.set_status(msg.to_string());
                }
            }
            Some(Command::ResetTimer) => {
                if self.session.reset_timer() {
                    self.set_status("Timer reset".to_string());
                }
            }
            None => {}
        }
        Ok(())
    }

    /// Keys that act on the session rather than on the current item.
    fn handle_session_key(&mut self, c: char) -> bool {
        let between_items = matches!(self.session.phase(), Phase::Idle | Phase::Exhausted);
        match c.to_ascii_lowercase() {
            's' if between_items => {
                self.session.start();
                true
            }
            'u' if between_items => {
                self.prompt = Some(Prompt::Reviewer(self.session.profile().reviewer_id.clone()));
                true
            }
            't' => {
                let current = self.session.profile().daily_target.to_string();
                self.prompt = Some(Prompt::DailyTarget(current));
                true
            }
            _ => false,
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.prompt = None,
            KeyCode::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt);
                }
            }
            KeyCode::Backspace => {
                prompt.buffer_mut().pop();
            }
            KeyCode::Char(c) => {
                if key_char(&key).is_some() {
                    prompt.buffer_mut().push(c);
                }
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        match prompt {
            Prompt::EscalationReason(reason) => {
                let outcome = self.session.dispatch(Action::Escalate {
                    reason: Some(reason),
                });
                self.report(outcome);
            }
            Prompt::Reviewer(name) => match self.session.set_reviewer(&name) {
                Ok(()) => {
                    let name = self.session.profile().reviewer_id.clone();
                    self.set_status(format!("Reviewing as {name}; press s to start"));
                }
                Err(err) => self.set_notice(Notice {
                    level: NoticeLevel::Error,
                    message: err.to_string(),
                    code: Some(err.code()),
                }),
            },
            Prompt::DailyTarget(raw) => match raw.trim().parse::<u32>() {
                Ok(target) if target > 0 => match self.session.set_daily_target(target) {
                    Ok(()) => self.set_status(format!("Daily target set to {target}")),
                    Err(err) => self.set_notice(Notice {
                        level: NoticeLevel::Error,
                        message: err.to_string(),
                        code: Some(err.code()),
                    }),
                },
                _ => self.set_notice(Notice {
                    level: NoticeLevel::Warning,
                    message: format!("'{}' is not a positive number", raw.trim()),
                    code: None,
                }),
            },
        }
    }

    fn report(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Submitting => self.set_status("Submitting…".to_string()),
            Outcome::FixOpened | Outcome::Ignored(Ignored::Disabled | Ignored::NoItem) => {}
            Outcome::Ignored(Ignored::Busy) => self.set_status("Still submitting…".to_string()),
            Outcome::Ignored(Ignored::NoSelection) => {
                self.set_status("Select a Class-level code to submit".to_string());
            }
        }
    }

    pub fn render(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_body(frame, chunks[1]);
        self.render_action_bar(frame, chunks[2]);
        self.render_status(frame, chunks[3]);

        if let Some(fix) = self.session.review().and_then(Review::fix) {
            fix_panel::render(frame, fix, area);
        }
        if let Some(prompt) = &self.prompt {
            render_prompt(frame, prompt, area);
        }
    }

    fn render_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let profile = self.session.profile();
        let mut spans = vec![
            Span::styled("Reviewer: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                profile.reviewer_id.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Done: ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{}/{}", self.session.completed(), profile.daily_target)),
        ];
        if let Some(queue) = &profile.queue {
            spans.push(Span::styled("  Queue: ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::raw(queue.clone()));
        }
        if let Some(elapsed) = self.session.elapsed() {
            let paused = self
                .session
                .review()
                .is_some_and(|review| review.timer().is_paused());
            spans.push(Span::styled("  Time: ", Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(
                format_clock(elapsed),
                Style::default().fg(if paused { Color::Yellow } else { Color::White }),
            ));
            if paused {
                spans.push(Span::styled(" (paused)", Style::default().fg(Color::Yellow)));
            }
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(" vetter ")
            .title_style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::Green));

        let lines = match self.session.phase() {
            Phase::Idle => vec![hint_line(&format!(
                "Press s to start reviewing as {}, u to change reviewer",
                self.session.profile().reviewer_id
            ))],
            Phase::Loading => vec![hint_line("Loading next item…")],
            Phase::Exhausted => vec![
                Line::from(Span::styled(
                    "All items validated",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )),
                hint_line("Press s to check the queue again"),
            ],
            Phase::Presenting(review) | Phase::Submitting { review, .. } => self.item_lines(review),
        };
        let title = match self.session.review() {
            Some(review) => format!(" {} --- {} ", review.item().id, review.mode()),
            None => " Item ".to_string(),
        };
        frame.render_widget(
            Paragraph::new(lines)
                .block(block.title(title))
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn item_lines(&self, review: &Review) -> Vec<Line<'static>> {
        let item = review.item();
        let mut lines = vec![Line::from(Span::styled(
            item.description.clone(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))];
        for (key, value) in &item.metadata {
            let shown = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{key}: "), Style::default().fg(Color::DarkGray)),
                Span::raw(shown),
            ]));
        }

        let candidates = review.candidates();
        let conflict = review.mode() == ReviewMode::Conflict;
        if let Some(code) = candidates.existing {
            lines.push(Line::from(""));
            lines.extend(self.candidate_lines("Existing", code, item.existing_label.as_deref(), conflict));
        }
        if let Some(code) = candidates.model {
            if candidates.existing != Some(code) {
                lines.push(Line::from(""));
                lines.extend(self.candidate_lines("Model", code, item.model_label.as_deref(), conflict));
            }
            lines.push(confidence_line(item));
        }
        if candidates.existing.is_none() && candidates.model.is_none() {
            lines.push(Line::from(""));
            lines.push(hint_line("No candidate code; fix or escalate"));
        }
        lines
    }

    fn candidate_lines(
        &self,
        heading: &str,
        code: &str,
        label: Option<&str>,
        conflict: bool,
    ) -> Vec<Line<'static>> {
        let heading_color = if conflict { Color::Yellow } else { Color::Green };
        let hierarchy = self.session.hierarchy(code);
        let title = hierarchy
            .last()
            .and_then(|entry| entry.classification.as_ref())
            .map(|c| c.title.clone())
            .or_else(|| label.map(str::to_string))
            .unwrap_or_default();
        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("{heading}: "),
                Style::default()
                    .fg(heading_color)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(code.to_string(), Style::default().fg(Color::Cyan)),
            Span::raw(format!("  {title}")),
        ])];
        lines.extend(hierarchy.iter().map(hierarchy_line));
        if let Some(class) = hierarchy.last().and_then(|e| e.classification.as_ref()) {
            for line in class.include_lines(DETAIL_LINES) {
                lines.push(Line::from(Span::styled(
                    format!("      + {line}"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for line in class.exclude_lines(DETAIL_LINES) {
                lines.push(Line::from(Span::styled(
                    format!("      - {line}"),
                    Style::default().fg(Color::DarkGray),
                )));
            }
        }
        lines
    }

    fn render_action_bar(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let busy = self.session.is_processing();
        let key_style = if busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        };

        let mut keys: Vec<(char, &str)> = self
            .session
            .review()
            .map(|review| router::legal_keys(&review.candidates()))
            .unwrap_or_default();
        if self.session.review().is_some() {
            keys.push(('p', "pause"));
            keys.push(('r', "reset timer"));
        } else {
            keys.push(('s', "start"));
            keys.push(('u', "reviewer"));
        }
        keys.push(('t', "target"));
        keys.push(('q', "quit"));

        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (key, label) in keys {
            spans.push(Span::styled(format!(" {key} "), key_style));
            spans.push(Span::raw(format!("{label} ")));
        }
        if busy {
            spans.push(Span::styled(" submitting…", Style::default().fg(Color::Yellow)));
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::DarkGray));
        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }

    fn render_status(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Some((msg, level, _)) = &self.status_msg else {
            return;
        };
        let color = match level {
            NoticeLevel::Info => Color::Green,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::Red,
        };
        frame.render_widget(
            Paragraph::new(Span::styled(msg.clone(), Style::default().fg(color))),
            area,
        );
    }
}

fn hint_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        text.to_string(),
        Style::default().fg(Color::DarkGray),
    ))
}

fn hierarchy_line(entry: &HierarchyEntry) -> Line<'static> {
    let title = entry
        .classification
        .as_ref()
        .map_or_else(|| "…".to_string(), |c| c.title.clone());
    Line::from(vec![
        Span::styled(
            format!("  {:<9} ", entry.level.label()),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("{:<10} ", entry.code), Style::default().fg(Color::Cyan)),
        Span::raw(title),
    ])
}

fn confidence_line(item: &Item) -> Line<'static> {
    let pct = (item.confidence_score * 100.0).clamp(0.0, 100.0);
    Line::from(vec![
        Span::styled("  confidence ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{pct:.0}%")),
    ])
}

fn render_prompt(frame: &mut ratatui::Frame<'_>, prompt: &Prompt, area: Rect) {
    let width = area.width.saturating_sub(8).min(70);
    let height = 3;
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let popup = Rect::new(x, y, width, height);

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::Green))
        .title(prompt.title())
        .title_style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    let text = with_cursor(prompt.buffer(), prompt.buffer().chars().count());
    frame.render_widget(Paragraph::new(text).block(block), popup);
}
