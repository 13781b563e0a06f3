//! Create issue view.
//!
//! A form holding a local `IssueDraft`. Submitting returns the draft to the
//! app, which runs the request and reports back through
//! `handle_submit_result`. While a submission is pending the form ignores
//! every key, so exactly one request is ever in flight.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tracing::{debug, error, info};

use crate::api::error::ApiError;
use crate::api::types::{IssueDraft, IssuePriority, IssueStatus};
use crate::ui::components::TextInput;
use crate::ui::theme::theme;

/// Shown when the form is submitted without a title.
pub const TITLE_REQUIRED_MESSAGE: &str = "Title is required";

/// Shown when the server rejected the issue without saying why.
pub const CREATE_FAILED_MESSAGE: &str = "Failed to create issue";

/// Shown when the form is submitted without a session.
pub const SIGN_IN_REQUIRED_MESSAGE: &str = "You must be signed in to create issues";

/// Focusable elements of the form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Description,
    Priority,
    Status,
    Assignee,
    Cancel,
    Create,
}

impl FormField {
    const ORDER: [FormField; 7] = [
        FormField::Title,
        FormField::Description,
        FormField::Priority,
        FormField::Status,
        FormField::Assignee,
        FormField::Cancel,
        FormField::Create,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    /// The next field, wrapping around.
    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    /// The previous field, wrapping around.
    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// Submission state of the form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmitState {
    /// Nothing submitted yet, or the last attempt succeeded.
    #[default]
    Idle,
    /// A create request is in flight.
    Pending,
    /// The last attempt failed with the given message.
    Failed(String),
}

/// Actions returned from the create issue view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateIssueAction {
    /// Send the draft to the server.
    Submit(IssueDraft),
    /// Leave the form without creating an issue.
    Cancel,
    /// The issue was created.
    Created,
}

/// The create issue form.
pub struct CreateIssueView {
    title: TextInput,
    description: TextInput,
    assignee: TextInput,
    priority: IssuePriority,
    status: IssueStatus,
    focus: FormField,
    submit_state: SubmitState,
}

impl Default for CreateIssueView {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateIssueView {
    /// Create an empty form.
    pub fn new() -> Self {
        let mut title = TextInput::new();
        title.set_placeholder("Enter issue title");
        let mut description = TextInput::new();
        description.set_placeholder("Describe the issue");
        let mut assignee = TextInput::new();
        assignee.set_placeholder("Assign to someone");

        Self {
            title,
            description,
            assignee,
            priority: IssuePriority::default(),
            status: IssueStatus::default(),
            focus: FormField::default(),
            submit_state: SubmitState::Idle,
        }
    }

    /// The draft as currently entered.
    pub fn draft(&self) -> IssueDraft {
        IssueDraft {
            title: self.title.value().to_string(),
            description: self.description.value().to_string(),
            priority: self.priority,
            status: self.status,
            assignee: self.assignee.value().to_string(),
        }
    }

    /// Get the focused field.
    pub fn focus(&self) -> FormField {
        self.focus
    }

    /// Get the submission state.
    pub fn submit_state(&self) -> &SubmitState {
        &self.submit_state
    }

    /// Check if a submission is in flight.
    pub fn is_pending(&self) -> bool {
        self.submit_state == SubmitState::Pending
    }

    /// The error message on display, if any.
    pub fn error(&self) -> Option<&str> {
        match &self.submit_state {
            SubmitState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Handle keyboard input.
    ///
    /// `signed_in` tells the form whether a submission can be sent at all.
    pub fn handle_input(&mut self, key: KeyEvent, signed_in: bool) -> Option<CreateIssueAction> {
        if self.is_pending() {
            debug!(code = ?key.code, "Ignoring input while submitting");
            return None;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => Some(CreateIssueAction::Cancel),
            (KeyCode::Tab, KeyModifiers::NONE) => {
                self.focus = self.focus.next();
                None
            }
            (KeyCode::BackTab, _) | (KeyCode::Tab, KeyModifiers::SHIFT) => {
                self.focus = self.focus.prev();
                None
            }
            (KeyCode::Enter, _) if self.focus == FormField::Cancel => {
                Some(CreateIssueAction::Cancel)
            }
            (KeyCode::Enter, _) => self.submit(signed_in),
            _ => {
                self.handle_field_input(key);
                None
            }
        }
    }

    fn handle_field_input(&mut self, key: KeyEvent) {
        match self.focus {
            FormField::Title => {
                self.title.handle_input(key);
            }
            FormField::Description => {
                self.description.handle_input(key);
            }
            FormField::Assignee => {
                self.assignee.handle_input(key);
            }
            FormField::Priority => match key.code {
                KeyCode::Left | KeyCode::Char('h') => self.priority = self.priority.prev(),
                KeyCode::Right | KeyCode::Char('l') => self.priority = self.priority.next(),
                _ => {}
            },
            FormField::Status => match key.code {
                KeyCode::Left | KeyCode::Char('h') => self.status = self.status.prev(),
                KeyCode::Right | KeyCode::Char('l') => self.status = self.status.next(),
                _ => {}
            },
            FormField::Cancel | FormField::Create => {}
        }
    }

    fn submit(&mut self, signed_in: bool) -> Option<CreateIssueAction> {
        let draft = self.draft();

        if !draft.has_title() {
            self.submit_state = SubmitState::Failed(TITLE_REQUIRED_MESSAGE.to_string());
            self.focus = FormField::Title;
            return None;
        }

        if !signed_in {
            self.submit_state = SubmitState::Failed(SIGN_IN_REQUIRED_MESSAGE.to_string());
            return None;
        }

        debug!(title = %draft.title, "Submitting new issue");
        self.submit_state = SubmitState::Pending;
        Some(CreateIssueAction::Submit(draft))
    }

    /// Apply the outcome of a submission.
    ///
    /// Returns `CreateIssueAction::Created` on success. On failure the draft
    /// is kept and the server's message (or a generic one) is shown.
    pub fn handle_submit_result(&mut self, result: Result<(), ApiError>) -> Option<CreateIssueAction> {
        if !self.is_pending() {
            debug!("Submission result arrived with nothing pending");
            return None;
        }

        match result {
            Ok(()) => {
                info!("Issue created");
                self.submit_state = SubmitState::Idle;
                Some(CreateIssueAction::Created)
            }
            Err(e) => {
                error!(error = %e, "Failed to create issue");
                let message = e.server_message().unwrap_or(CREATE_FAILED_MESSAGE);
                self.submit_state = SubmitState::Failed(message.to_string());
                None
            }
        }
    }

    /// Render the form as a centered dialog.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let dialog_width = 70u16.min(area.width.saturating_sub(4));
        let dialog_height = 22u16.min(area.height.saturating_sub(2));
        let dialog_area = centered_rect(area, dialog_width, dialog_height);

        frame.render_widget(Clear, dialog_area);

        let t = theme();
        let block = Block::default()
            .title(Span::styled(
                " Create New Issue ",
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(t.accent));

        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Description
                Constraint::Length(3), // Priority
                Constraint::Length(3), // Status
                Constraint::Length(3), // Assignee
                Constraint::Length(2), // Error / progress
                Constraint::Length(1), // Buttons
            ])
            .split(inner);

        self.title
            .render_with_label(frame, chunks[0], "Title *", self.focus == FormField::Title);
        self.description.render_with_label(
            frame,
            chunks[1],
            "Description",
            self.focus == FormField::Description,
        );
        render_picker(
            frame,
            chunks[2],
            "Priority",
            Span::styled(self.priority.as_str(), t.priority_style(self.priority)),
            self.focus == FormField::Priority,
        );
        render_picker(
            frame,
            chunks[3],
            "Status",
            Span::styled(self.status.as_str(), t.status_style(self.status)),
            self.focus == FormField::Status,
        );
        self.assignee.render_with_label(
            frame,
            chunks[4],
            "Assignee",
            self.focus == FormField::Assignee,
        );
        self.render_status_line(frame, chunks[5]);
        self.render_buttons(frame, chunks[6]);
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect) {
        let t = theme();
        let line = match &self.submit_state {
            SubmitState::Failed(message) => {
                Span::styled(message.clone(), Style::default().fg(t.error))
            }
            SubmitState::Pending => {
                Span::styled("Creating issue...", Style::default().fg(t.warning))
            }
            SubmitState::Idle => return,
        };
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    }

    fn render_buttons(&self, frame: &mut Frame, area: Rect) {
        let t = theme();
        let pending = self.is_pending();

        let button_style = |focused: bool, color: Color| {
            if pending {
                Style::default().fg(t.muted)
            } else if focused {
                Style::default()
                    .fg(t.selection_fg)
                    .bg(color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(color)
            }
        };

        let create_text = if pending { " Creating... " } else { " Create Issue " };

        let line = Line::from(vec![
            Span::styled(" Cancel ", button_style(self.focus == FormField::Cancel, t.fg)),
            Span::raw("    "),
            Span::styled(
                create_text,
                button_style(self.focus == FormField::Create, t.success),
            ),
        ]);
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
    }
}

/// Render a left/right option picker.
fn render_picker(frame: &mut Frame, area: Rect, label: &str, value: Span<'static>, focused: bool) {
    let t = theme();

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

    let arrows = Style::default().fg(if focused { t.accent } else { t.muted });
    let line = Line::from(vec![Span::styled("← ", arrows), value, Span::styled(" →", arrows)]);

    let block = Block::default()
        .title(Span::styled(format!(" {} ", label), title_style))
        .borders(Borders::ALL)
        .border_style(border_style);

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Calculate a centered rectangle within the given area.
fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
