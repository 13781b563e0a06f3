//! Theme and styling configuration.

use std::sync::OnceLock;

use ratatui::style::{Color, Modifier, Style};

use crate::api::types::{IssuePriority, IssueStatus};

/// Color theme for the application.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary foreground color.
    pub fg: Color,
    /// Secondary text (metadata, hints).
    pub muted: Color,
    /// Accent color for titles and focus.
    pub accent: Color,
    /// Border of unfocused widgets.
    pub border: Color,
    /// Border of the focused widget.
    pub border_focused: Color,
    /// Text typed into inputs.
    pub input_fg: Color,
    /// Placeholder text in empty inputs.
    pub input_placeholder: Color,
    /// Foreground of the selected row.
    pub selection_fg: Color,
    /// Background of the selected row.
    pub selection_bg: Color,
    /// Success messages and buttons.
    pub success: Color,
    /// Warnings and busy states.
    pub warning: Color,
    /// Errors.
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::White,
            muted: Color::DarkGray,
            accent: Color::Cyan,
            border: Color::DarkGray,
            border_focused: Color::Yellow,
            input_fg: Color::White,
            input_placeholder: Color::DarkGray,
            selection_fg: Color::Black,
            selection_bg: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
        }
    }
}

impl Theme {
    /// Badge style for an issue status.
    pub fn status_style(&self, status: IssueStatus) -> Style {
        let color = match status {
            IssueStatus::Open => Color::Blue,
            IssueStatus::InProgress => self.warning,
            IssueStatus::Resolved => self.success,
            IssueStatus::Closed => self.muted,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Label style for an issue priority.
    pub fn priority_style(&self, priority: IssuePriority) -> Style {
        match priority {
            IssuePriority::Low => Style::default().fg(self.muted),
            IssuePriority::Medium => Style::default().fg(Color::Blue),
            IssuePriority::High => Style::default().fg(self.warning),
            IssuePriority::Urgent => Style::default().fg(self.error).add_modifier(Modifier::BOLD),
        }
    }
}

static THEME: OnceLock<Theme> = OnceLock::new();

/// Get the active theme.
pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_is_shared() {
        assert!(std::ptr::eq(theme(), theme()));
    }

    #[test]
    fn test_urgent_priority_is_bold_error() {
        let t = Theme::default();
        let style = t.priority_style(IssuePriority::Urgent);
        assert_eq!(style.fg, Some(t.error));
        assert!(style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_status_styles_differ() {
        let t = Theme::default();
        assert_ne!(
            t.status_style(IssueStatus::Open),
            t.status_style(IssueStatus::Closed)
        );
    }
}
