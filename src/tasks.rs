//! Async task management for non-blocking API operations.
//!
//! HTTP calls run as background tokio tasks so the UI stays responsive:
//! 1. A view returns an action that needs the network (fetch, submit)
//! 2. The app spawns the call through `TaskSpawner`, tagged with a request id
//! 3. The task sends an `ApiMessage` through the channel when it completes
//! 4. The main loop drains the channel with `try_recv()` and hands each
//!    result to the app, which drops results whose request id is stale

use tokio::sync::mpsc;
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::types::{Issue, IssueDraft};
use crate::api::{IssueClient, Session};

/// Identifier tying a background result to the view mount that asked for it.
pub type RequestId = u64;

/// Messages sent from background tasks to the main event loop.
#[derive(Debug)]
pub enum ApiMessage {
    /// Result of fetching the issue list.
    IssuesFetched {
        request_id: RequestId,
        result: Result<Vec<Issue>, ApiError>,
    },

    /// Result of submitting a new issue.
    IssueCreated {
        request_id: RequestId,
        result: Result<(), ApiError>,
    },
}

impl ApiMessage {
    /// The request id this message answers.
    pub fn request_id(&self) -> RequestId {
        match self {
            ApiMessage::IssuesFetched { request_id, .. }
            | ApiMessage::IssueCreated { request_id, .. } => *request_id,
        }
    }
}

/// Spawns background tasks for API operations.
#[derive(Clone)]
pub struct TaskSpawner {
    tx: mpsc::UnboundedSender<ApiMessage>,
    client: IssueClient,
}

impl TaskSpawner {
    /// Create a new TaskSpawner sending results through `tx`.
    pub fn new(tx: mpsc::UnboundedSender<ApiMessage>, client: IssueClient) -> Self {
        Self { tx, client }
    }

    /// Spawn a task fetching every issue visible to the session.
    pub fn spawn_fetch_issues(&self, request_id: RequestId, session: Session) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        debug!(request_id, "Spawning issue fetch");
        tokio::spawn(async move {
            let result = client.list_issues(&session).await;
            let _ = tx.send(ApiMessage::IssuesFetched { request_id, result });
        });
    }

    /// Spawn a task creating an issue from the draft.
    pub fn spawn_create_issue(&self, request_id: RequestId, session: Session, draft: IssueDraft) {
        let tx = self.tx.clone();
        let client = self.client.clone();
        debug!(request_id, "Spawning issue creation");
        tokio::spawn(async move {
            let result = client.create_issue(&session, &draft).await;
            let _ = tx.send(ApiMessage::IssueCreated { request_id, result });
        });
    }
}
