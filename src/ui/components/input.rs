//! Text input component.
//!
//! Single-line text input with cursor movement and the usual readline
//! shortcuts (Ctrl+A/E/U/W). The cursor counts characters, not bytes, so
//! non-ASCII input edits correctly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::events::is_text_input;
use crate::ui::theme::theme;

/// A text input widget.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    /// The current input value.
    value: String,
    /// Cursor position, in characters.
    cursor: usize,
    /// Placeholder text shown when empty.
    placeholder: String,
}

impl TextInput {
    /// Create a new empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new input with an initial value.
    pub fn with_value(value: impl Into<String>) -> Self {
        let mut input = Self::new();
        input.set_value(value);
        input
    }

    /// Set the placeholder text.
    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    /// Get the current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the value and move cursor to end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.char_count();
    }

    /// Clear the input.
    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Check if the input is empty.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Get the cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    /// Byte offset of a character index.
    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Handle keyboard input.
    ///
    /// Returns true if the value was modified.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                self.cursor = 0;
                false
            }
            (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.char_count();
                false
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                if self.value.is_empty() {
                    false
                } else {
                    self.clear();
                    true
                }
            }
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => self.delete_word(),
            (KeyCode::Char(c), modifiers) if is_text_input(modifiers) => {
                self.insert_char(c);
                true
            }
            (KeyCode::Backspace, _) => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                    true
                } else {
                    false
                }
            }
            (KeyCode::Delete, _) => {
                if self.cursor < self.char_count() {
                    let at = self.byte_index(self.cursor);
                    self.value.remove(at);
                    true
                } else {
                    false
                }
            }
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                if self.cursor < self.char_count() {
                    self.cursor += 1;
                }
                false
            }
            (KeyCode::Home, _) => {
                self.cursor = 0;
                false
            }
            (KeyCode::End, _) => {
                self.cursor = self.char_count();
                false
            }
            _ => false,
        }
    }

    /// Delete the word before the cursor.
    fn delete_word(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let end = self.byte_index(self.cursor);
        let before = &self.value[..end];
        let start = before
            .trim_end()
            .rfind(|c: char| !c.is_alphanumeric())
            .map(|i| i + before[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        self.value.replace_range(start..end, "");
        self.cursor = self.value[..start].chars().count();
        true
    }

    /// Insert a character at the cursor position.
    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Render the input field with a label in its border.
    pub fn render_with_label(&self, frame: &mut Frame, area: Rect, label: &str, focused: bool) {
        let t = theme();
        let showing_placeholder = self.value.is_empty() && !self.placeholder.is_empty();

        let display = if showing_placeholder {
            self.placeholder.clone()
        } else {
            self.value.clone()
        };

        let style = if showing_placeholder {
            Style::default().fg(t.input_placeholder)
        } else if focused {
            Style::default().fg(t.border_focused)
        } else {
            Style::default().fg(t.input_fg)
        };

        let border_style = if focused {
            Style::default().fg(t.border_focused)
        } else {
            Style::default().fg(t.border)
        };

        let title_style = if focused {
            Style::default()
                .fg(t.border_focused)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(t.fg)
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        frame.render_widget(Paragraph::new(display).style(style).block(block), area);

        if focused {
            let cursor_x = area.x + 1 + self.cursor as u16;
            let cursor_y = area.y + 1;

            if cursor_x < area.x + area.width.saturating_sub(1) {
                frame.set_cursor_position(Position::new(cursor_x, cursor_y));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(input: &mut TextInput, s: &str) {
        for c in s.chars() {
            input.handle_input(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_new_input() {
        let input = TextInput::new();
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_with_value() {
        let input = TextInput::with_value("hello");
        assert_eq!(input.value(), "hello");
        assert_eq!(input.cursor(), 5);
    }

    #[test]
    fn test_character_input() {
        let mut input = TextInput::new();
        type_str(&mut input, "abc");
        assert_eq!(input.value(), "abc");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn test_shift_character_input() {
        let mut input = TextInput::new();
        assert!(input.handle_input(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)));
        assert_eq!(input.value(), "A");
    }

    #[test]
    fn test_altgr_character_input() {
        let mut input = TextInput::new();
        let altgr = KeyEvent::new(KeyCode::Char('{'), KeyModifiers::CONTROL | KeyModifiers::ALT);
        assert!(input.handle_input(altgr));
        assert_eq!(input.value(), "{");

        let alt = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::ALT);
        assert!(!input.handle_input(alt));
        assert_eq!(input.value(), "{");
    }

    #[test]
    fn test_backspace() {
        let mut input = TextInput::with_value("abc");
        assert!(input.handle_input(key(KeyCode::Backspace)));
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn test_backspace_at_start() {
        let mut input = TextInput::with_value("abc");
        input.handle_input(key(KeyCode::Home));
        assert!(!input.handle_input(key(KeyCode::Backspace)));
        assert_eq!(input.value(), "abc");
    }

    #[test]
    fn test_delete_at_cursor() {
        let mut input = TextInput::with_value("abc");
        input.handle_input(key(KeyCode::Home));
        assert!(input.handle_input(key(KeyCode::Delete)));
        assert_eq!(input.value(), "bc");
        assert!(!TextInput::with_value("x").handle_input(key(KeyCode::Delete)));
    }

    #[test]
    fn test_insert_in_middle() {
        let mut input = TextInput::with_value("ac");
        input.handle_input(key(KeyCode::Left));
        input.handle_input(key(KeyCode::Char('b')));
        assert_eq!(input.value(), "abc");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut input = TextInput::new();
        type_str(&mut input, "héllo wörld");
        assert_eq!(input.cursor(), 11);

        input.handle_input(key(KeyCode::Backspace));
        assert_eq!(input.value(), "héllo wörl");

        input.handle_input(key(KeyCode::Home));
        input.handle_input(key(KeyCode::Right));
        input.handle_input(key(KeyCode::Delete));
        assert_eq!(input.value(), "hllo wörl");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut input = TextInput::with_value("ab");
        input.handle_input(key(KeyCode::Right));
        assert_eq!(input.cursor(), 2);
        input.handle_input(key(KeyCode::Home));
        input.handle_input(key(KeyCode::Left));
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_ctrl_a_and_ctrl_e() {
        let mut input = TextInput::with_value("hello");
        input.handle_input(ctrl('a'));
        assert_eq!(input.cursor(), 0);
        input.handle_input(ctrl('e'));
        assert_eq!(input.cursor(), 5);
        assert_eq!(input.value(), "hello");
    }

    #[test]
    fn test_ctrl_u_clear() {
        let mut input = TextInput::with_value("hello");
        assert!(input.handle_input(ctrl('u')));
        assert!(input.is_empty());
        assert!(!input.handle_input(ctrl('u')));
    }

    #[test]
    fn test_ctrl_w_delete_word() {
        let mut input = TextInput::with_value("hello world");
        assert!(input.handle_input(ctrl('w')));
        assert_eq!(input.value(), "hello ");
        assert_eq!(input.cursor(), 6);
    }

    #[test]
    fn test_placeholder_does_not_change_value() {
        let mut input = TextInput::new();
        input.set_placeholder("Enter issue title");
        assert!(input.is_empty());
        assert_eq!(input.value(), "");
    }
}
