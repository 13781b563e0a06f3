//! Issues API client and types.
//!
//! This module provides the interface for communicating with the issue
//! tracker REST API.

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod types;

pub use auth::{AuthContext, Session};
pub use client::IssueClient;
pub use endpoints::ApiEndpoints;
pub use error::ApiError;
pub use types::{Issue, IssueDraft, IssuePriority, IssueStatus};
