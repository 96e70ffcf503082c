//! Terminal user interface for `vt review`.
//!
//! ## Entry points
//!
//! - [`run`]: take over the terminal and drive a [`review::ReviewView`]
//!   until the operator quits.

pub mod fix_panel;
pub mod keys;
pub mod review;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;

use review::ReviewView;

/// How long to wait for input before polling the session again.
const TICK: Duration = Duration::from_millis(50);

/// Restores the terminal even when the loop bails out early.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            tracing::warn!("failed to leave raw mode: {err}");
        }
        if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen) {
            tracing::warn!("failed to leave alternate screen: {err}");
        }
    }
}

pub fn run(view: &mut ReviewView) -> Result<()> {
    enable_raw_mode()?;
    let guard = TerminalGuard;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, view);
    terminal.show_cursor()?;
    drop(guard);
    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, view: &mut ReviewView) -> Result<()> {
    loop {
        terminal.draw(|frame| view.render(frame, frame.area()))?;
        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    view.handle_key(key)?;
                }
            }
        }
        view.tick()?;
        if view.should_quit() {
            return Ok(());
        }
    }
}

/// `value` with a block cursor drawn at `char_idx`.
pub(crate) fn with_cursor(value: &str, char_idx: usize) -> String {
    let mut out = String::new();
    let mut inserted = false;
    for (idx, ch) in value.chars().enumerate() {
        if idx == char_idx {
            out.push('█');
            inserted = true;
        }
        out.push(ch);
    }
    if !inserted {
        out.push('█');
    }
    out
}
