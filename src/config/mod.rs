//! Configuration management for LazyIssues.
//!
//! This module handles loading and saving the user configuration file and
//! resolving the API and web URLs from flags, environment and file.

mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::endpoints::DEFAULT_API_BASE;

pub use settings::Settings;

/// Environment variable overriding the API base URL.
pub const API_URL_ENV: &str = "LAZYISSUES_API_URL";

/// Environment variable overriding the web frontend URL.
pub const WEB_URL_ENV: &str = "LAZYISSUES_WEB_URL";

/// Environment variable supplying a session token.
pub const TOKEN_ENV: &str = "LAZYISSUES_TOKEN";

/// Default web frontend URL, used to open issue pages in a browser.
pub const DEFAULT_WEB_URL: &str = "http://localhost:5173";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform configuration directory could not be determined.
    #[error("could not determine configuration directory")]
    NoConfigDir,

    /// The configuration directory could not be created.
    #[error("failed to create configuration directory: {0}")]
    CreateDirError(std::io::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration file: {0}")]
    ReadError(std::io::Error),

    /// The configuration file could not be written.
    #[error("failed to write configuration file: {0}")]
    WriteError(std::io::Error),

    /// The configuration file is not valid TOML for [`Config`].
    #[error("failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A configuration value is invalid.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// The persisted user configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the issues API.
    pub api_url: Option<String>,
    /// Base URL of the web frontend.
    pub web_url: Option<String>,
    /// Display name of the signed-in user.
    pub user_name: Option<String>,
    /// Application settings.
    pub settings: Settings,
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join("lazyissues").join("config.toml"))
    }

    /// Load the configuration from the default path.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load the configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;

        info!(path = %path.display(), "Configuration loaded");
        Ok(config)
    }

    /// Save the configuration to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    /// Save the configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::CreateDirError)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents).map_err(ConfigError::WriteError)?;

        info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Validate this configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("api_url", &self.api_url), ("web_url", &self.web_url)] {
            if let Some(url) = url {
                validate_url(name, url)?;
            }
        }

        if self.settings.tick_rate_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick_rate_ms must be greater than zero".to_string(),
            ));
        }

        if self.settings.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.settings.date_format.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "date_format cannot be empty".to_string(),
            ));
        }

        if StrftimeItems::new(&self.settings.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::ValidationError(format!(
                "date_format '{}' is not a valid strftime format",
                self.settings.date_format
            )));
        }

        Ok(())
    }

    /// Resolve the API base URL: flag, then environment, then file, then default.
    pub fn resolve_api_url(&self, flag: Option<&str>) -> String {
        resolve_url(flag, API_URL_ENV, self.api_url.as_deref(), DEFAULT_API_BASE)
    }

    /// Resolve the web frontend URL: flag, then environment, then file, then default.
    pub fn resolve_web_url(&self, flag: Option<&str>) -> String {
        resolve_url(flag, WEB_URL_ENV, self.web_url.as_deref(), DEFAULT_WEB_URL)
    }
}

fn validate_url(name: &str, url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{} cannot be empty",
            name
        )));
    }

    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(ConfigError::ValidationError(format!(
            "{} must start with http:// or https://",
            name
        )));
    }

    Ok(())
}

fn resolve_url(flag: Option<&str>, env_var: &str, file: Option<&str>, default: &str) -> String {
    let env_value = std::env::var(env_var).ok();
    let url = [flag, env_value.as_deref(), file]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(default);

    url.trim_end_matches('/').to_string()
}
