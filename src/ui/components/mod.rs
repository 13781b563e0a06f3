//! Reusable UI components.

mod help_bar;
mod input;
mod loading;
mod notification;
mod search_bar;

pub use help_bar::render_context_help;
pub use input::TextInput;
pub use loading::LoadingIndicator;
pub use notification::NotificationManager;
pub use search_bar::{filter_issues, highlight_text, render_search_bar, results_info, QuickSearch};
