//! Issues API client implementation.
//!
//! This module provides the HTTP client for the issue tracker REST API. It
//! attaches the session's bearer token, maps HTTP failures onto [`ApiError`]
//! and decodes the response envelopes.

use std::time::Duration;

use reqwest::{header, Client, Response, StatusCode};
use tracing::{debug, error, info, instrument, warn};

use super::auth::Session;
use super::endpoints::ApiEndpoints;
use super::error::{ApiError, Result};
use super::types::{ErrorBody, Issue, IssueDraft, ListEnvelope};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The issues API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct IssueClient {
    /// The HTTP client.
    client: Client,
    /// Absolute URLs of the API resources.
    endpoints: ApiEndpoints,
}

impl IssueClient {
    /// Create a new client for the given endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoints: ApiEndpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Network)?;

        info!(base = %endpoints.base, "Issues API client created");
        Ok(Self { client, endpoints })
    }

    /// Create a client with the default timeout.
    pub fn with_endpoints(endpoints: ApiEndpoints) -> Result<Self> {
        Self::new(endpoints, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Fetch every issue visible to the session.
    ///
    /// Calls `GET {base}/issues`. A body other than `{ success: true, data: [...] }`
    /// yields an empty list rather than an error.
    #[instrument(skip(self, session))]
    pub async fn list_issues(&self, session: &Session) -> Result<Vec<Issue>> {
        let url = format!("{}/issues", self.endpoints.base);
        debug!(url = %url, "Fetching issues");

        let response = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, session.header_value())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                error!("Issue fetch failed: {}", e);
                ApiError::Network(e)
            })?;

        let body = Self::success_body(response).await?;
        let issues = parse_list_body(&body)?;
        debug!("Fetched {} issues", issues.len());
        Ok(issues)
    }

    /// Create a new issue from a draft.
    ///
    /// Calls `POST {endpoints.issues}` with the draft as JSON. Any 2xx status
    /// is success and the body is not inspected.
    #[instrument(skip(self, session, draft), fields(title = %draft.title))]
    pub async fn create_issue(&self, session: &Session, draft: &IssueDraft) -> Result<()> {
        debug!(url = %self.endpoints.issues, "Creating issue");

        let response = self
            .client
            .post(&self.endpoints.issues)
            .header(header::AUTHORIZATION, session.header_value())
            .header(header::CONTENT_TYPE, "application/json")
            .json(draft)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!(status = %status, "Issue created");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Error response body: {}", body);
        let err = rejection_from_body(status, &body);
        warn!("Issue creation rejected: {}", err);
        Err(err)
    }

    /// Read the body of a successful response or map the failure status.
    async fn success_body(response: Response) -> Result<String> {
        let status = response.status();
        let url = response.url().to_string();

        if status.is_success() {
            response
                .text()
                .await
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response: {}", e)))
        } else {
            let error_body = response.text().await.unwrap_or_default();
            debug!("Error response body: {}", error_body);
            let err = ApiError::from_status(status, &url);
            error!("Request failed: {}", err);
            Err(err)
        }
    }
}

/// Decode a list response body.
///
/// Only `{ "success": true, "data": [...] }` produces issues. Any other shape
/// is treated as an empty result and the server's reason is logged. A body
/// that is not JSON at all, or issues that fail to decode, are errors.
pub fn parse_list_body(body: &str) -> Result<Vec<Issue>> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    let envelope: ListEnvelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Unexpected list response shape, showing no issues: {}", e);
            return Ok(Vec::new());
        }
    };

    let reason = envelope.reason().unwrap_or("none").to_string();
    match envelope.data {
        Some(data @ serde_json::Value::Array(_)) if envelope.success => {
            serde_json::from_value(data).map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to parse issues: {}", e))
            })
        }
        _ => {
            warn!(
                success = envelope.success,
                reason = %reason,
                "List response carried no issues"
            );
            Ok(Vec::new())
        }
    }
}

/// Build the error for a rejected write request.
///
/// The body is parsed as JSON and its `message` kept when present.
pub fn rejection_from_body(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty());

    ApiError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{IssuePriority, IssueStatus};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const TWO_ISSUES: &str = r#"{"success":true,"data":[
        {"_id":"a1","title":"A","status":"Open","priority":"Low"},
        {"_id":"b2","title":"B","status":"Closed","priority":"High","commentCount":2}
    ]}"#;

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    fn request_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        buf.len() >= header_end + 4 + content_length
    }

    /// Accept one connection, answer it with `response`, and return the raw request.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            while !request_complete(&buf) {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&buf).into_owned()
        });

        (format!("http://{}/api", addr), handle)
    }

    fn client_for(base: &str) -> IssueClient {
        IssueClient::with_endpoints(ApiEndpoints::from_base(base)).unwrap()
    }

    #[test]
    fn test_parse_list_body_success() {
        let issues = parse_list_body(TWO_ISSUES).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[1].status, IssueStatus::Closed);
        assert_eq!(issues[1].priority, IssuePriority::High);
    }

    #[test]
    fn test_parse_list_body_success_false_is_empty() {
        let issues = parse_list_body(r#"{"success":false,"message":"no access"}"#).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parse_list_body_missing_data_is_empty() {
        let issues = parse_list_body(r#"{"success":true}"#).unwrap();
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parse_list_body_non_object_is_empty() {
        assert!(parse_list_body("[]").unwrap().is_empty());
        assert!(parse_list_body(r#"{"success":"yes"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_list_body_not_json_is_error() {
        let err = parse_list_body("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_list_body_bad_issue_is_error() {
        let err = parse_list_body(r#"{"success":true,"data":[{"title":"no id"}]}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_rejection_keeps_server_message() {
        let err = rejection_from_body(StatusCode::BAD_REQUEST, r#"{"message":"Title exists"}"#);
        assert_eq!(err.server_message(), Some("Title exists"));
        assert!(matches!(err, ApiError::Rejected { status: 400, .. }));
    }

    #[test]
    fn test_rejection_without_body() {
        let err = rejection_from_body(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.server_message(), None);
        assert!(matches!(err, ApiError::Rejected { status: 500, .. }));
    }

    #[test]
    fn test_rejection_with_unparseable_body() {
        let err = rejection_from_body(StatusCode::BAD_GATEWAY, "Bad Gateway");
        assert_eq!(err.server_message(), None);
    }

    #[tokio::test]
    async fn test_list_issues_sends_bearer_token() {
        let (base, server) = serve_once(http_response("200 OK", TWO_ISSUES)).await;
        let client = client_for(&base);

        let issues = client.list_issues(&Session::new("tok123")).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(issues.len(), 2);
        assert!(request.starts_with("GET /api/issues HTTP/1.1"));
        assert!(request
            .to_lowercase()
            .contains("authorization: bearer tok123"));
    }

    #[tokio::test]
    async fn test_list_issues_unauthorized() {
        let (base, server) =
            serve_once(http_response("401 Unauthorized", r#"{"message":"bad token"}"#)).await;
        let client = client_for(&base);

        let err = client.list_issues(&Session::new("tok")).await.unwrap_err();
        server.await.unwrap();

        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_create_issue_posts_draft() {
        let (base, server) = serve_once(http_response("201 Created", "")).await;
        let client = client_for(&base);
        let draft = IssueDraft {
            title: "Login broken".to_string(),
            ..IssueDraft::default()
        };

        client
            .create_issue(&Session::new("tok"), &draft)
            .await
            .unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("POST /api/issues HTTP/1.1"));
        let lower = request.to_lowercase();
        assert!(lower.contains("authorization: bearer tok"));
        assert!(lower.contains("content-type: application/json"));

        let body = request.split("\r\n\r\n").nth(1).unwrap();
        let sent: IssueDraft = serde_json::from_str(body).unwrap();
        assert_eq!(sent, draft);
    }

    #[tokio::test]
    async fn test_create_issue_rejected_with_message() {
        let (base, server) = serve_once(http_response(
            "400 Bad Request",
            r#"{"success":false,"message":"Title too short"}"#,
        ))
        .await;
        let client = client_for(&base);
        let draft = IssueDraft {
            title: "x".to_string(),
            ..IssueDraft::default()
        };

        let err = client
            .create_issue(&Session::new("tok"), &draft)
            .await
            .unwrap_err();
        server.await.unwrap();

        assert_eq!(err.server_message(), Some("Title too short"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{}/api", addr));
        let err = client.list_issues(&Session::new("tok")).await.unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
    }
}
