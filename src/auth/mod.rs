//! Authentication module for the Reeve client.
//!
//! Holds the bearer token attached to outgoing requests. A token comes either
//! from the configured API key or from a login; the login token wins while it
//! is held. The token is owned by one client instance and shared with its
//! executor by reference, never through global state.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::types::LoginResponse;

/// Authentication provider trait.
///
/// Implementations add credentials to the headers of an outgoing request.
pub trait AuthProvider: Send + Sync {
    /// Apply authentication to request headers. Leaves the headers untouched
    /// when no credential is available.
    fn apply_auth(&self, headers: &mut HashMap<String, String>);
}

/// The token obtained by a successful login.
#[derive(Clone)]
pub struct SessionToken {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
    username: Option<String>,
    role: Option<String>,
}

impl SessionToken {
    /// Creates a session token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::new(token.into()),
            expires_at: None,
            username: None,
            role: None,
        }
    }

    /// Sets the expiry.
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Returns the bearer token.
    pub fn token(&self) -> &SecretString {
        &self.token
    }

    /// Returns the expiry reported by the service.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the authenticated username.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the role of the authenticated user.
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Returns true once the expiry has passed.
    ///
    /// Informational only: the token keeps being sent until the caller logs
    /// in again.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

impl From<&LoginResponse> for SessionToken {
    fn from(response: &LoginResponse) -> Self {
        Self {
            token: SecretString::new(response.token.clone()),
            expires_at: response.expires_at,
            username: response.username.clone(),
            role: response.role.clone(),
        }
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish()
    }
}

/// Holds the bearer token of one client.
///
/// Writes replace the whole token at once; requests already sent keep the
/// token they were sent with.
pub struct TokenManager {
    static_key: Option<SecretString>,
    session: RwLock<Option<SessionToken>>,
}

impl TokenManager {
    /// Creates a manager with an optional pre-issued API key.
    pub fn new(static_key: Option<SecretString>) -> Self {
        Self {
            static_key,
            session: RwLock::new(None),
        }
    }

    /// Replaces the session token.
    pub fn store(&self, token: SessionToken) {
        tracing::debug!(
            username = token.username().unwrap_or_default(),
            expires_at = ?token.expires_at(),
            "Stored session token"
        );
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Returns the session token obtained by login, if any.
    pub fn current(&self) -> Option<SessionToken> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drops the session token. The API key, if any, stays.
    pub fn clear_session(&self) {
        self.session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Returns true when a login token is held.
    pub fn has_session(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn bearer(&self) -> Option<String> {
        if let Some(session) = self
            .session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Some(session.token().expose_secret().clone());
        }

        self.static_key
            .as_ref()
            .map(|key| key.expose_secret().clone())
    }
}

impl AuthProvider for TokenManager {
    fn apply_auth(&self, headers: &mut HashMap<String, String>) {
        if let Some(token) = self.bearer() {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("api_key", &self.static_key.as_ref().map(|_| "[REDACTED]"))
            .field("session", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn authorization(manager: &TokenManager) -> Option<String> {
        let mut headers = HashMap::new();
        manager.apply_auth(&mut headers);
        headers.remove("Authorization")
    }

    #[test]
    fn test_no_token_no_header() {
        let manager = TokenManager::new(None);
        assert_eq!(authorization(&manager), None);
        assert!(!manager.has_session());
    }

    #[test]
    fn test_api_key_is_sent() {
        let manager = TokenManager::new(Some(SecretString::new("key-123".to_string())));
        assert_eq!(authorization(&manager).as_deref(), Some("Bearer key-123"));
        assert!(!manager.has_session());
    }

    #[test]
    fn test_session_token_wins_over_api_key() {
        let manager = TokenManager::new(Some(SecretString::new("key-123".to_string())));
        manager.store(SessionToken::new("jwt-1"));
        assert_eq!(authorization(&manager).as_deref(), Some("Bearer jwt-1"));

        manager.clear_session();
        assert_eq!(authorization(&manager).as_deref(), Some("Bearer key-123"));
    }

    #[test]
    fn test_store_replaces_token() {
        let manager = TokenManager::new(None);
        manager.store(SessionToken::new("jwt-1"));
        manager.store(SessionToken::new("jwt-2"));

        let current = manager.current().unwrap();
        assert_eq!(current.token().expose_secret(), "jwt-2");
    }

    #[test]
    fn test_session_from_login_response() {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "token": "jwt",
            "expiresAt": "2020-01-01T00:00:00Z",
            "username": "admin",
            "role": "Admin"
        }))
        .unwrap();

        let token = SessionToken::from(&response);
        assert_eq!(token.username(), Some("admin"));
        assert_eq!(token.role(), Some("Admin"));
        assert!(token.is_expired());
    }

    #[test]
    fn test_expiry() {
        let token = SessionToken::new("jwt").with_expiry(Utc::now() + Duration::hours(1));
        assert!(!token.is_expired());
        assert!(!SessionToken::new("jwt").is_expired());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let manager = TokenManager::new(Some(SecretString::new("key-secret".to_string())));
        manager.store(SessionToken::new("jwt-secret"));
        let debug = format!("{manager:?}");

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("key-secret"));
        assert!(!debug.contains("jwt-secret"));
    }
}
