//! crossterm key events reduced to what the router understands.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// The plain character of `key`, if it carries no Ctrl/Alt modifier.
pub fn key_char(key: &KeyEvent) -> Option<char> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Char(c) => Some(c),
        _ => None,
    }
}

/// Ctrl-C quits from anywhere, even while a text field has focus.
pub fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c' | 'C'))
}
