//! Issue tracker API request and response types.
//!
//! These types model the JSON documents exchanged with the issues REST API.

use std::fmt::{self, Write as _};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Fallback shown when an issue has no author name.
pub const UNKNOWN_AUTHOR: &str = "Unknown User";

/// The workflow status of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IssueStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    /// All statuses in picker order.
    pub const ALL: [IssueStatus; 4] = [
        IssueStatus::Open,
        IssueStatus::InProgress,
        IssueStatus::Resolved,
        IssueStatus::Closed,
    ];

    /// The wire and display name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "Open",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::Resolved => "Resolved",
            IssueStatus::Closed => "Closed",
        }
    }

    /// The next status in picker order, wrapping around.
    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    /// The previous status in picker order, wrapping around.
    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The priority of an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IssuePriority {
    #[default]
    Low,
    Medium,
    High,
    Urgent,
}

impl IssuePriority {
    /// All priorities in picker order.
    pub const ALL: [IssuePriority; 4] = [
        IssuePriority::Low,
        IssuePriority::Medium,
        IssuePriority::High,
        IssuePriority::Urgent,
    ];

    /// The wire and display name of the priority.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssuePriority::Low => "Low",
            IssuePriority::Medium => "Medium",
            IssuePriority::High => "High",
            IssuePriority::Urgent => "Urgent",
        }
    }

    /// The next priority in picker order, wrapping around.
    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    /// The previous priority in picker order, wrapping around.
    pub fn prev(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: usize) -> T {
    let index = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(index + step) % all.len()]
}

/// The user who created an issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// The author's display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// An issue as returned by `GET /issues`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Opaque, stable identifier.
    #[serde(rename = "_id")]
    pub id: String,
    /// The issue title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Workflow status.
    pub status: IssueStatus,
    /// Priority.
    pub priority: IssuePriority,
    /// Name of the person the issue is assigned to.
    #[serde(default)]
    pub assignee: Option<String>,
    /// The user who created the issue.
    #[serde(default)]
    pub author: Option<Author>,
    /// Optional category label.
    #[serde(default)]
    pub category: Option<String>,
    /// Number of comments on the issue.
    #[serde(default)]
    pub comment_count: Option<u32>,
    /// When the issue was created.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Get the author's display name, or "Unknown User" if not set.
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .and_then(|a| a.name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Get the comment count, defaulting to zero.
    pub fn comment_count(&self) -> u32 {
        self.comment_count.unwrap_or(0)
    }

    /// Get the description if it is present and non-empty.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.is_empty())
    }

    /// Format the creation date (date only, local time) with a chrono format string.
    ///
    /// Returns an empty string when the API did not supply a timestamp or the
    /// format string cannot be rendered.
    pub fn created_date(&self, format: &str) -> String {
        let Some(ts) = self.created_at else {
            return String::new();
        };
        let mut date = String::new();
        if write!(date, "{}", ts.with_timezone(&Local).format(format)).is_err() {
            return String::new();
        }
        date
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.title)
    }
}

/// The envelope wrapping list responses: `{ "success": bool, "data": [...] }`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEnvelope {
    /// Whether the server reports success.
    #[serde(default)]
    pub success: bool,
    /// The payload, present on success.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    /// Optional human readable reason, usually set when `success` is false.
    #[serde(default)]
    pub message: Option<String>,
    /// Alternative reason field used by some endpoints.
    #[serde(default)]
    pub error: Option<String>,
}

impl ListEnvelope {
    /// The reason reported by the server, if any.
    pub fn reason(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

/// Error body returned by rejected write requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// The server supplied message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A client-local draft of a new issue, sent as the body of `POST /issues`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    /// Issue title. Required.
    pub title: String,
    /// Description, may be empty.
    pub description: String,
    /// Priority, `Low` by default.
    pub priority: IssuePriority,
    /// Status, `Open` by default.
    pub status: IssueStatus,
    /// Assignee name, may be empty.
    pub assignee: String,
}

impl IssueDraft {
    /// Check whether the draft can be submitted.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issue_json() -> serde_json::Value {
        serde_json::json!({
            "_id": "65a1f0",
            "title": "Login broken",
            "description": "Cannot sign in with SSO",
            "status": "In Progress",
            "priority": "Urgent",
            "assignee": "dana",
            "author": { "name": "Sam" },
            "category": "auth",
            "commentCount": 4,
            "createdAt": "2024-03-05T10:15:00.000Z"
        })
    }

    #[test]
    fn test_parse_full_issue() {
        let issue: Issue = serde_json::from_value(issue_json()).unwrap();

        assert_eq!(issue.id, "65a1f0");
        assert_eq!(issue.title, "Login broken");
        assert_eq!(issue.status, IssueStatus::InProgress);
        assert_eq!(issue.priority, IssuePriority::Urgent);
        assert_eq!(issue.assignee.as_deref(), Some("dana"));
        assert_eq!(issue.author_name(), "Sam");
        assert_eq!(issue.category.as_deref(), Some("auth"));
        assert_eq!(issue.comment_count(), 4);
        assert_eq!(
            issue.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 15, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_minimal_issue() {
        let json = serde_json::json!({
            "_id": "1",
            "title": "Minimal",
            "status": "Open",
            "priority": "Low"
        });
        let issue: Issue = serde_json::from_value(json).unwrap();

        assert_eq!(issue.description, None);
        assert_eq!(issue.author_name(), UNKNOWN_AUTHOR);
        assert_eq!(issue.comment_count(), 0);
        assert_eq!(issue.created_date("%Y"), "");
    }

    #[test]
    fn test_parse_issue_with_null_fields() {
        let json = serde_json::json!({
            "_id": "1",
            "title": "Nulls",
            "description": null,
            "status": "Closed",
            "priority": "High",
            "assignee": null,
            "author": null,
            "commentCount": null
        });
        let issue: Issue = serde_json::from_value(json).unwrap();
        assert_eq!(issue.author_name(), UNKNOWN_AUTHOR);
        assert_eq!(issue.comment_count(), 0);
    }

    #[test]
    fn test_author_without_name_falls_back() {
        let mut issue: Issue = serde_json::from_value(issue_json()).unwrap();
        issue.author = Some(Author { name: None });
        assert_eq!(issue.author_name(), "Unknown User");
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut json = issue_json();
        json["status"] = serde_json::json!("Blocked");
        assert!(serde_json::from_value::<Issue>(json).is_err());
    }

    #[test]
    fn test_empty_description_is_hidden() {
        let mut issue: Issue = serde_json::from_value(issue_json()).unwrap();
        issue.description = Some(String::new());
        assert_eq!(issue.description_text(), None);
    }

    #[test]
    fn test_created_date_is_date_only() {
        let mut issue: Issue = serde_json::from_value(issue_json()).unwrap();
        issue.created_at = Some(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap());
        let date = issue.created_date("%-m/%-d/%Y");

        // The calendar day depends on the local offset, month and year do not.
        assert!(date.starts_with("3/"));
        assert!(date.ends_with("/2024"));
        assert!(!date.contains(':'));
    }

    #[test]
    fn test_created_date_with_unknown_specifier_is_empty() {
        let mut issue: Issue = serde_json::from_value(issue_json()).unwrap();
        issue.created_at = Some(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap());
        assert_eq!(issue.created_date("%Q"), "");
    }

    #[test]
    fn test_status_wire_names() {
        for status in IssueStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::json!(status.as_str()));
        }
    }

    #[test]
    fn test_status_cycle_wraps() {
        assert_eq!(IssueStatus::Open.next(), IssueStatus::InProgress);
        assert_eq!(IssueStatus::Closed.next(), IssueStatus::Open);
        assert_eq!(IssueStatus::Open.prev(), IssueStatus::Closed);
    }

    #[test]
    fn test_priority_cycle_wraps() {
        assert_eq!(IssuePriority::Low.next(), IssuePriority::Medium);
        assert_eq!(IssuePriority::Urgent.next(), IssuePriority::Low);
        assert_eq!(IssuePriority::Low.prev(), IssuePriority::Urgent);
    }

    #[test]
    fn test_draft_defaults() {
        let draft = IssueDraft::default();
        assert_eq!(draft.priority, IssuePriority::Low);
        assert_eq!(draft.status, IssueStatus::Open);
        assert!(draft.title.is_empty());
        assert!(!draft.has_title());
    }

    #[test]
    fn test_draft_serialization_shape() {
        let draft = IssueDraft {
            title: "Login broken".to_string(),
            ..IssueDraft::default()
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "title": "Login broken",
                "description": "",
                "priority": "Low",
                "status": "Open",
                "assignee": ""
            })
        );
    }

    #[test]
    fn test_envelope_reason() {
        let envelope: ListEnvelope =
            serde_json::from_str(r#"{"success":false,"message":"token expired"}"#).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.reason(), Some("token expired"));

        let envelope: ListEnvelope = serde_json::from_str(r#"{"error":"nope"}"#).unwrap();
        assert_eq!(envelope.reason(), Some("nope"));
    }
}
