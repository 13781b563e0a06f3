//! Search component for filtering loaded issues.
//!
//! Filtering is a pure function of the issue collection and the search term:
//! a case-insensitive substring match against title, description, status,
//! priority, assignee and category, where any matching field keeps the issue.

use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::api::types::Issue;
use crate::ui::theme::theme;

/// Placeholder shown in the search bar when no term is entered.
pub const SEARCH_PLACEHOLDER: &str =
    "Search issues by title, description, status, priority, assignee, or category...";

/// Check whether an issue matches an already lowercased search term.
pub fn issue_matches(issue: &Issue, term_lower: &str) -> bool {
    let contains = |field: &str| field.to_lowercase().contains(term_lower);

    contains(&issue.title)
        || issue.description.as_deref().is_some_and(contains)
        || contains(issue.status.as_str())
        || contains(issue.priority.as_str())
        || issue.assignee.as_deref().is_some_and(contains)
        || issue.category.as_deref().is_some_and(contains)
}

/// Filter issues by a free-text search term.
///
/// An empty term returns the whole collection. Order is preserved.
pub fn filter_issues(issues: &[Issue], term: &str) -> Vec<Issue> {
    if term.is_empty() {
        return issues.to_vec();
    }

    let term_lower = term.to_lowercase();
    issues
        .iter()
        .filter(|issue| issue_matches(issue, &term_lower))
        .cloned()
        .collect()
}

/// Search term state for the issue list.
#[derive(Debug, Clone, Default)]
pub struct QuickSearch {
    /// The current search term.
    query: String,
    /// Whether the search bar is accepting input.
    active: bool,
}

impl QuickSearch {
    /// Create a new, empty search.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting input, keeping the current term.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Stop accepting input, keeping the current term.
    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Check if search input is active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Get the current search term.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replace the search term.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Check if the search term is empty.
    pub fn is_empty(&self) -> bool {
        self.query.is_empty()
    }

    /// Push a character to the term.
    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
    }

    /// Remove the last character from the term.
    pub fn pop_char(&mut self) -> Option<char> {
        self.query.pop()
    }
}

/// Summary line shown under the search bar when a term is set.
pub fn results_info(count: usize, query: &str) -> String {
    format!(
        "Found {} issue{} matching \"{}\"",
        count,
        if count == 1 { "" } else { "s" },
        query
    )
}

/// Highlight case-insensitive matches of `query` in `text`.
pub fn highlight_text(text: &str, query: &str, base: Style) -> Line<'static> {
    let ranges = match_ranges(text, query);
    if ranges.is_empty() {
        return Line::from(Span::styled(text.to_string(), base));
    }

    let highlight = Style::default()
        .bg(theme().warning)
        .fg(theme().selection_fg)
        .add_modifier(Modifier::BOLD);

    let mut spans = Vec::new();
    let mut last_end = 0;
    for (start, end) in ranges {
        if start > last_end {
            spans.push(Span::styled(text[last_end..start].to_string(), base));
        }
        spans.push(Span::styled(text[start..end].to_string(), highlight));
        last_end = end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base));
    }

    Line::from(spans)
}

/// Byte ranges of non-overlapping case-insensitive matches.
///
/// Works on characters, so matches stay on valid boundaries even when
/// lowercasing changes a character's byte length.
fn match_ranges(text: &str, query: &str) -> Vec<(usize, usize)> {
    if query.is_empty() {
        return Vec::new();
    }

    let query_lower = query.to_lowercase();
    let mut ranges = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        match match_at(text, pos, &query_lower) {
            Some(end) => {
                ranges.push((pos, end));
                pos = end;
            }
            None => pos += text[pos..].chars().next().map_or(1, char::len_utf8),
        }
    }

    ranges
}

fn match_at(text: &str, start: usize, query_lower: &str) -> Option<usize> {
    let mut lowered = String::new();
    for (offset, c) in text[start..].char_indices() {
        lowered.extend(c.to_lowercase());
        if lowered == query_lower {
            return Some(start + offset + c.len_utf8());
        }
        if !query_lower.starts_with(lowered.as_str()) {
            return None;
        }
    }
    None
}

/// Render the search bar at the given area.
pub fn render_search_bar(frame: &mut Frame, area: Rect, search: &QuickSearch) {
    let t = theme();

    let (text, style) = if search.is_empty() && !search.is_active() {
        (format!("🔍 {}", SEARCH_PLACEHOLDER), Style::default().fg(t.muted))
    } else if search.is_active() {
        (format!("🔍 {}", search.query()), Style::default().fg(t.border_focused))
    } else {
        (format!("🔍 {}", search.query()), Style::default().fg(t.fg))
    };

    frame.render_widget(Paragraph::new(text).style(style), area);

    if search.is_active() {
        // The magnifier glyph is two cells wide, followed by a space.
        let x = area.x + 3 + search.query().chars().count() as u16;
        if x < area.x + area.width {
            frame.set_cursor_position(Position::new(x, area.y));
        }
    }
}
