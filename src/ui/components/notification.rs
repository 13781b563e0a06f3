//! Toast notifications for transient feedback ("Issue created", browser errors).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::ui::theme::theme;

/// Maximum number of toasts kept at once.
const MAX_VISIBLE: usize = 3;

/// The kind of notification, which determines its appearance and lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    Success,
    Error,
}

impl NotificationType {
    fn icon(&self) -> &'static str {
        match self {
            NotificationType::Success => "✓",
            NotificationType::Error => "✗",
        }
    }

    fn style(&self) -> Style {
        let t = theme();
        match self {
            NotificationType::Success => Style::default().fg(t.success),
            NotificationType::Error => Style::default().fg(t.error),
        }
    }
}

/// A single notification message.
#[derive(Debug, Clone)]
pub struct Notification {
    /// The notification message.
    pub message: String,
    /// The type of notification.
    pub kind: NotificationType,
    created_at: Instant,
    duration: Duration,
}

impl Notification {
    /// Create a success notification shown for 3 seconds.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Success, Duration::from_secs(3))
    }

    /// Create an error notification shown for 5 seconds.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Error, Duration::from_secs(5))
    }

    fn new(message: impl Into<String>, kind: NotificationType, duration: Duration) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at: Instant::now(),
            duration,
        }
    }

    /// Check if the notification has expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.duration
    }
}

/// Queue of visible notifications.
#[derive(Debug, Default)]
pub struct NotificationManager {
    notifications: VecDeque<Notification>,
}

impl NotificationManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a notification, dropping the oldest beyond the visible limit.
    pub fn push(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
        while self.notifications.len() > MAX_VISIBLE {
            self.notifications.pop_front();
        }
    }

    /// Add a success notification.
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notification::success(message));
    }

    /// Add an error notification.
    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notification::error(message));
    }

    /// Remove expired notifications. Called on each tick.
    pub fn tick(&mut self) {
        self.notifications.retain(|n| !n.is_expired());
    }

    /// Number of queued notifications.
    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    /// Check if there are any notifications.
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Iterate over the queued notifications, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    /// Render notifications stacked in the bottom-right corner.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = 50.min(area.width.saturating_sub(4));
        let mut bottom = area.y + area.height.saturating_sub(1);

        for notification in self.notifications.iter().rev() {
            let height = 3;
            if bottom < area.y + height {
                break;
            }
            bottom -= height;
            let rect = Rect::new(
                area.x + area.width.saturating_sub(width + 2),
                bottom,
                width,
                height,
            );
            render_notification(notification, frame, rect);
        }
    }
}

fn render_notification(notification: &Notification, frame: &mut Frame, area: Rect) {
    frame.render_widget(Clear, area);

    let style = notification.kind.style();
    let text = Line::from(vec![
        Span::styled(
            format!("{} ", notification.kind.icon()),
            style.add_modifier(Modifier::BOLD),
        ),
        Span::styled(notification.message.clone(), style),
    ]);

    let paragraph = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).border_style(style))
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}
