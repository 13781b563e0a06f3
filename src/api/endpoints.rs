//! API endpoint map.

/// Default API base URL used when nothing else is configured.
pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";

/// Absolute URLs of the API resources the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// The API base, without trailing slash.
    pub base: String,
    /// The issues collection.
    pub issues: String,
}

impl ApiEndpoints {
    /// Build the endpoint map from an API base URL.
    pub fn from_base(base: &str) -> Self {
        let base = normalize_base_url(base);
        Self {
            issues: format!("{}/issues", base),
            base,
        }
    }
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self::from_base(DEFAULT_API_BASE)
    }
}

/// Normalize a base URL by removing trailing slashes.
pub fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');

    if !url.starts_with("https://") && !url.contains("localhost") && !url.contains("127.0.0.1")
    {
        tracing::warn!("URL does not use HTTPS: {}. This is insecure for production use.", url);
    }

    url.to_string()
}
