//! User interface components and views.
//!
//! This module contains all TUI rendering logic, including views for the
//! issue list and the create issue form and the components they share.

pub mod components;
pub mod theme;
pub mod views;

pub use components::{render_context_help, NotificationManager};
pub use views::{CreateIssueAction, CreateIssueView, ListAction, ListView};
