//! Issue list view.
//!
//! Shows every issue visible to the current session as a summary card and
//! narrows the list with a free-text search. The view never talks to the
//! network itself: it returns a `ListAction` and the app runs the request,
//! handing the outcome back through `handle_fetch_result`.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tracing::{debug, error, info};

use crate::api::auth::AuthContext;
use crate::api::error::ApiError;
use crate::api::types::Issue;
use crate::events::{is_text_input, KeyContext};
use crate::ui::components::{
    filter_issues, highlight_text, render_search_bar, results_info, LoadingIndicator, QuickSearch,
};
use crate::ui::theme::theme;

/// Message shown when the issue list cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load issues";

/// Loading state of the issue collection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    /// No session, nothing was requested.
    #[default]
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The collection has been loaded.
    Loaded,
    /// The last fetch failed.
    Failed(String),
}

/// Actions returned from the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
    /// Fetch the issue collection for the current session.
    Fetch,
    /// Remount the view and fetch again.
    Retry,
    /// Open the detail page of an issue.
    OpenIssue(String),
    /// Open the comments section of an issue.
    OpenComments(String),
    /// Go to the create issue form.
    CreateIssue,
    /// Quit the application.
    Quit,
}

/// The issue list view.
pub struct ListView {
    load_state: LoadState,
    /// Every issue returned by the last successful fetch.
    issues: Vec<Issue>,
    /// `issues` narrowed by the search term, kept in sync by `recompute_filter`.
    filtered: Vec<Issue>,
    search: QuickSearch,
    /// Index into `filtered`.
    selected: usize,
    /// Session generation the current collection belongs to.
    seen_generation: Option<u64>,
    loading: LoadingIndicator,
    date_format: String,
}

impl ListView {
    /// Create a freshly mounted list view.
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            load_state: LoadState::Idle,
            issues: Vec::new(),
            filtered: Vec::new(),
            search: QuickSearch::new(),
            selected: 0,
            seen_generation: None,
            loading: LoadingIndicator::with_message("Loading issues..."),
            date_format: date_format.into(),
        }
    }

    /// Get the load state.
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    /// Every loaded issue.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// The issues matching the current search term.
    pub fn filtered(&self) -> &[Issue] {
        &self.filtered
    }

    /// The current search term.
    pub fn search_term(&self) -> &str {
        self.search.query()
    }

    /// Whether the search bar is taking input.
    pub fn is_searching(&self) -> bool {
        self.search.is_active()
    }

    /// Index of the selected issue within the filtered list.
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The selected issue, if any.
    pub fn selected_issue(&self) -> Option<&Issue> {
        self.filtered.get(self.selected)
    }

    /// React to the session context.
    ///
    /// Returns `ListAction::Fetch` when the session changed since the last
    /// call and a token is present. Without a token the view goes idle and
    /// drops the collection.
    pub fn on_session_changed(&mut self, auth: &AuthContext) -> Option<ListAction> {
        let generation = auth.generation();
        if self.seen_generation == Some(generation) {
            return None;
        }
        self.seen_generation = Some(generation);

        if auth.is_signed_in() {
            debug!(generation, "Session changed, fetching issues");
            self.load_state = LoadState::Loading;
            self.loading.start();
            Some(ListAction::Fetch)
        } else {
            debug!(generation, "No session, skipping issue fetch");
            self.load_state = LoadState::Idle;
            self.loading.stop();
            self.issues.clear();
            self.recompute_filter();
            None
        }
    }

    /// Apply the outcome of a fetch.
    pub fn handle_fetch_result(&mut self, result: Result<Vec<Issue>, ApiError>) {
        self.loading.stop();
        match result {
            Ok(issues) => {
                info!(count = issues.len(), "Loaded issues");
                self.issues = issues;
                self.load_state = LoadState::Loaded;
            }
            Err(e) => {
                error!(error = %e, "Failed to load issues");
                self.issues.clear();
                self.load_state = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
            }
        }
        self.recompute_filter();
    }

    /// Replace the search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search.set_query(term);
        self.recompute_filter();
    }

    /// Re-derive the filtered list from the collection and the search term.
    pub fn recompute_filter(&mut self) {
        self.filtered = filter_issues(&self.issues, self.search.query());
        if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len().saturating_sub(1);
        }
    }

    /// Advance the loading animation.
    pub fn tick(&mut self) {
        self.loading.tick();
    }

    /// The help bar context for the current state.
    pub fn key_context(&self) -> KeyContext {
        if self.search.is_active() {
            KeyContext::IssueSearch
        } else if matches!(self.load_state, LoadState::Failed(_)) {
            KeyContext::IssueListError
        } else {
            KeyContext::IssueList
        }
    }

    /// Heading and hint shown when there is nothing to list.
    pub fn empty_message(&self) -> (&'static str, &'static str) {
        if self.search.is_empty() {
            ("No issues found", "Create your first issue to get started")
        } else {
            ("No matching issues found", "Try adjusting your search terms")
        }
    }

    /// Handle keyboard input.
    ///
    /// Returns an optional action to be handled by the app.
    pub fn handle_input(&mut self, key: KeyEvent) -> Option<ListAction> {
        if self.search.is_active() {
            self.handle_search_input(key);
            return None;
        }

        match key.code {
            KeyCode::Char('q') => Some(ListAction::Quit),
            KeyCode::Char('j') | KeyCode::Down => {
                self.select_next();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.select_prev();
                None
            }
            KeyCode::Char('g') | KeyCode::Home => {
                self.selected = 0;
                None
            }
            KeyCode::Char('G') | KeyCode::End => {
                self.selected = self.filtered.len().saturating_sub(1);
                None
            }
            KeyCode::Char('/') => {
                self.search.activate();
                None
            }
            KeyCode::Esc if !self.search.is_empty() => {
                self.set_search_term("");
                None
            }
            KeyCode::Enter => self
                .selected_issue()
                .map(|issue| ListAction::OpenIssue(issue.id.clone())),
            KeyCode::Char('c') => self
                .selected_issue()
                .map(|issue| ListAction::OpenComments(issue.id.clone())),
            KeyCode::Char('n') => Some(ListAction::CreateIssue),
            KeyCode::Char('r') => match self.load_state {
                LoadState::Loaded | LoadState::Failed(_) => Some(ListAction::Retry),
                LoadState::Idle | LoadState::Loading => None,
            },
            _ => None,
        }
    }

    fn handle_search_input(&mut self, key: KeyEvent) {
        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => {
                self.search.deactivate();
                self.set_search_term("");
            }
            (KeyCode::Enter, _) => self.search.deactivate(),
            (KeyCode::Backspace, _) => {
                if self.search.pop_char().is_some() {
                    self.recompute_filter();
                }
            }
            (KeyCode::Char(c), modifiers) if is_text_input(modifiers) => {
                self.search.push_char(c);
                self.recompute_filter();
            }
            _ => {}
        }
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.filtered.len() {
            self.selected += 1;
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Render the list view.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let info_height = if self.search.is_empty() { 0 } else { 1 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(info_height),
                Constraint::Min(0),
            ])
            .split(area);

        render_search_bar(frame, chunks[0], &self.search);
        if !self.search.is_empty() && self.load_state == LoadState::Loaded {
            let info = results_info(self.filtered.len(), self.search.query());
            frame.render_widget(
                Paragraph::new(info).style(Style::default().fg(theme().muted)),
                chunks[1],
            );
        }

        match &self.load_state {
            LoadState::Idle => render_centered(
                frame,
                chunks[2],
                "Not signed in",
                "Run `lazyissues auth login --token <TOKEN>` to sign in",
                theme().muted,
            ),
            LoadState::Loading => {
                let middle = vertical_middle(chunks[2]);
                self.loading.render(frame, middle);
            }
            LoadState::Failed(message) => render_centered(
                frame,
                chunks[2],
                message,
                "Press r to retry",
                theme().error,
            ),
            LoadState::Loaded if self.filtered.is_empty() => {
                let (heading, hint) = self.empty_message();
                render_centered(frame, chunks[2], heading, hint, theme().fg);
            }
            LoadState::Loaded => self.render_issues(frame, chunks[2]),
        }
    }

    fn render_issues(&self, frame: &mut Frame, area: Rect) {
        let t = theme();
        let items: Vec<ListItem> = self
            .filtered
            .iter()
            .map(|issue| ListItem::new(self.issue_card(issue)))
            .collect();

        let block = Block::default()
            .title(Span::styled(
                format!(" Issues ({}) ", self.filtered.len()),
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.border));

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(t.selection_bg).fg(t.selection_fg))
            .highlight_symbol("▌ ");

        let mut state = ListState::default().with_selected(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    /// Summary card of one issue.
    fn issue_card(&self, issue: &Issue) -> Vec<Line<'static>> {
        let t = theme();
        let query = self.search.query();
        let muted = Style::default().fg(t.muted);

        let mut title = highlight_text(
            &issue.title,
            query,
            Style::default().fg(t.fg).add_modifier(Modifier::BOLD),
        );
        title.spans.push(Span::raw("  "));
        title.spans.push(Span::styled(
            format!("[{}]", issue.status),
            t.status_style(issue.status),
        ));

        let mut lines = vec![
            title,
            Line::from(Span::styled(
                format!("Created by: {}", issue.author_name()),
                muted,
            )),
        ];

        if let Some(description) = issue.description_text() {
            let first = description.lines().next().unwrap_or_default();
            lines.push(highlight_text(first, query, Style::default().fg(t.fg)));
        }

        let mut meta = vec![Span::styled(
            format!("{} Priority", issue.priority),
            t.priority_style(issue.priority),
        )];
        let date = issue.created_date(&self.date_format);
        if !date.is_empty() {
            meta.push(Span::styled(format!(" · {}", date), muted));
        }
        meta.push(Span::styled(
            format!(" · {} comments", issue.comment_count()),
            muted,
        ));
        lines.push(Line::from(meta));
        lines.push(Line::default());

        lines
    }
}

fn vertical_middle(area: Rect) -> Rect {
    let y = area.y + area.height / 2;
    Rect::new(area.x, y.min(area.y + area.height), area.width, 1u16.min(area.height))
}

fn render_centered(
    frame: &mut Frame,
    area: Rect,
    heading: &str,
    hint: &str,
    color: Color,
) {
    let t = theme();
    let text = vec![
        Line::from(Span::styled(
            heading.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(hint.to_string(), Style::default().fg(t.muted))),
    ];
    let middle = Rect::new(
        area.x,
        area.y + area.height.saturating_sub(2) / 2,
        area.width,
        2u16.min(area.height),
    );
    frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), middle);
}
