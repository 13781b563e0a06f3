//! Application views (screens).

mod create_issue;
mod list;

pub use create_issue::{
    CreateIssueAction, CreateIssueView, CREATE_FAILED_MESSAGE, SIGN_IN_REQUIRED_MESSAGE,
};
pub use list::{ListAction, ListView, LoadState};
