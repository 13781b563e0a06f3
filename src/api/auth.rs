//! Session handling for the issues API.
//!
//! A [`Session`] is a bearer token plus a minimal user identity. It lives in an
//! [`AuthContext`] that is handed to every view explicitly. Tokens are
//! persisted between runs in the OS keyring.

use std::fmt;

use super::error::{ApiError, Result};

/// The keyring service name for stored session tokens.
const KEYRING_SERVICE: &str = "lazyissues";

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// The bearer token.
    token: String,
    /// Display name of the signed-in user, if known.
    user_name: Option<String>,
}

impl Session {
    /// Create a session from a bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_name: None,
        }
    }

    /// Attach a user display name.
    pub fn with_user(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    /// The raw bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The signed-in user's display name.
    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    /// The complete `Authorization` header value.
    pub fn header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_name", &self.user_name)
            .finish()
    }
}

/// Holder of the current session.
///
/// Every login, logout or expiry bumps `generation`, so consumers can tell
/// that the token changed by comparing against the last generation they saw.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    session: Option<Session>,
    generation: u64,
}

impl AuthContext {
    /// Create an empty (signed out) context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context that starts signed in.
    pub fn with_session(session: Session) -> Self {
        let mut ctx = Self::new();
        ctx.login(session);
        ctx
    }

    /// Replace the current session.
    pub fn login(&mut self, session: Session) {
        tracing::info!(user = ?session.user_name(), "Session established");
        self.session = Some(session);
        self.generation += 1;
    }

    /// Clear the session at the user's request.
    pub fn logout(&mut self) {
        tracing::info!("Session cleared by logout");
        self.clear();
    }

    /// Clear the session because the token is no longer valid.
    pub fn expire(&mut self) {
        tracing::warn!("Session expired");
        self.clear();
    }

    fn clear(&mut self) {
        if self.session.take().is_some() {
            self.generation += 1;
        }
    }

    /// The current session, if signed in.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether a session is present.
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    /// Counter that changes whenever the session changes.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Store a session token in the OS keyring.
///
/// # Arguments
///
/// * `profile` - The profile name to use as the keyring username
/// * `token` - The bearer token to store
///
/// # Errors
///
/// Returns an error if the token cannot be stored in the keyring.
pub fn store_token(profile: &str, token: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile)
        .map_err(|e| ApiError::Keyring(format!("failed to create keyring entry: {}", e)))?;

    entry
        .set_password(token)
        .map_err(|e| ApiError::Keyring(format!("failed to store token: {}", e)))?;

    Ok(())
}

/// Retrieve a session token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be retrieved from the keyring.
pub fn get_token(profile: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .get_password()
        .map_err(|e| ApiError::Keyring(format!("failed to retrieve token: {}", e)))
}

/// Delete a session token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be deleted from the keyring.
pub fn delete_token(profile: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, profile)
        .map_err(|e| ApiError::Keyring(format!("failed to access keyring: {}", e)))?;

    entry
        .delete_password()
        .map_err(|e| ApiError::Keyring(format!("failed to delete token: {}", e)))?;

    Ok(())
}

/// Check if a token exists in the OS keyring for a profile.
pub fn has_token(profile: &str) -> bool {
    get_token(profile).is_ok()
}
