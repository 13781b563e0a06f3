//! Application settings configuration.

use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_TIMEOUT_SECS;

/// Application-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Event loop tick rate in milliseconds.
    pub tick_rate_ms: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// chrono format string used for issue creation dates.
    pub date_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_rate_ms: 100,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            date_format: "%-m/%-d/%Y".to_string(),
        }
    }
}
