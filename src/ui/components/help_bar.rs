//! Contextual help bar component.
//!
//! Displays key hints for the active screen at the bottom of the terminal.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::events::{get_context_hints, KeyContext};
use crate::ui::theme::theme;

/// Render the hint line for the given context.
pub fn render_context_help(frame: &mut Frame, area: Rect, context: KeyContext) {
    let spans = parse_hints_to_spans(get_context_hints(context));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Split a hint string into styled spans, keys (in brackets) highlighted.
fn parse_hints_to_spans(hints: &str) -> Vec<Span<'static>> {
    let t = theme();
    let text_style = Style::default().fg(t.muted);
    let key_style = Style::default().fg(t.accent);

    let mut spans = Vec::new();
    let mut rest = hints;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|i| open + i) else {
            break;
        };
        if open > 0 {
            spans.push(Span::styled(rest[..open].to_string(), text_style));
        }
        spans.push(Span::styled(rest[open..=close].to_string(), key_style));
        rest = &rest[close + 1..];
    }

    if !rest.is_empty() {
        spans.push(Span::styled(rest.to_string(), text_style));
    }

    spans
}
