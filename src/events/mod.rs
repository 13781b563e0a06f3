//! Event handling for the application.
//!
//! This module handles keyboard input, terminal resizes and ticks.

mod handler;
mod keys;

use crossterm::event::{KeyEvent, KeyModifiers};

pub use handler::EventHandler;
pub use keys::{get_context_hints, KeyContext};

/// Application events fed into `App::update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize(u16, u16),
    /// Periodic tick for animations.
    Tick,
    /// Request to quit the application.
    Quit,
}

/// Whether a character key with these modifiers should be typed as text.
///
/// Shift is allowed. Ctrl+Alt together is how Windows reports AltGr, so it
/// counts as text too; Ctrl or Alt alone is a shortcut.
pub fn is_text_input(modifiers: KeyModifiers) -> bool {
    let modifiers = modifiers.difference(KeyModifiers::SHIFT);
    modifiers.is_empty() || modifiers == KeyModifiers::CONTROL | KeyModifiers::ALT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_shifted_chars_are_text() {
        assert!(is_text_input(KeyModifiers::NONE));
        assert!(is_text_input(KeyModifiers::SHIFT));
    }

    #[test]
    fn test_altgr_is_text() {
        assert!(is_text_input(KeyModifiers::CONTROL | KeyModifiers::ALT));
        assert!(is_text_input(
            KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT
        ));
    }

    #[test]
    fn test_shortcuts_are_not_text() {
        assert!(!is_text_input(KeyModifiers::CONTROL));
        assert!(!is_text_input(KeyModifiers::ALT));
        assert!(!is_text_input(KeyModifiers::CONTROL | KeyModifiers::SHIFT));
    }
}
