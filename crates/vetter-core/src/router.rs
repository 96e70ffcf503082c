//! Key-to-action routing for the review screen.
//!
//! The router is pure: it turns a key and the current view context into a
//! [`Command`], or nothing when the key is not legal right now. Everything it
//! returns goes through [`ReviewSession`](crate::session::ReviewSession);
//! it never touches session state itself.

use crate::conflict::Candidates;
use crate::session::Action;

/// What a routed key asks the caller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Dispatch(Action),
    TogglePause,
    ResetTimer,
    Quit,
}

/// Input context at the moment a key arrives.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    /// Candidates of the presented item, if any.
    pub candidates: Option<Candidates<'a>>,
    /// A text field or modal panel owns the keyboard.
    pub input_captured: bool,
}

/// Map `key` to a command. Keys are case-insensitive.
#[must_use]
pub fn route(key: char, ctx: RouteContext<'_>) -> Option<Command> {
    if ctx.input_captured {
        return None;
    }

    let key = key.to_ascii_lowercase();
    if key == 'q' {
        return Some(Command::Quit);
    }

    let candidates = ctx.candidates?;
    let action = match key {
        'a' => Action::Accept { code: None },
        'm' => Action::AcceptModel,
        'x' => Action::AcceptExisting,
        'f' => Action::Fix { code: None },
        'e' => Action::Escalate { reason: None },
        'p' => return Some(Command::TogglePause),
        'r' => return Some(Command::ResetTimer),
        _ => return None,
    };
    action
        .is_enabled(&candidates)
        .then_some(Command::Dispatch(action))
}

/// Action-bar entries `(key, label)` legal for `candidates`.
#[must_use]
pub fn legal_keys(candidates: &Candidates<'_>) -> Vec<(char, &'static str)> {
    let mut keys = Vec::with_capacity(4);
    if candidates.has_conflict() {
        keys.push(('m', "accept model"));
        keys.push(('x', "keep existing"));
    } else {
        keys.push(('a', "accept"));
    }
    keys.push(('f', "fix"));
    keys.push(('e', "escalate"));
    keys
}
