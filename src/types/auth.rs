//! Authentication request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::serde_helpers::option_timestamp;

/// The authenticated principal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// User ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role, e.g. `Admin` or `User`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Payload returned by a successful login.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token (JWT).
    pub token: String,
    /// Token expiry.
    #[serde(default, with = "option_timestamp", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Authenticated username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Role of the authenticated user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("username", &self.username)
            .field("role", &self.role)
            .finish()
    }
}

/// Payload returned by user registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// Service message.
    #[serde(default)]
    pub message: String,
    /// The created user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserInfo>,
}

/// Payload returned by a password change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordResponse {
    /// Service message.
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

#[derive(Serialize)]
pub(crate) struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_response_parsing() {
        let response: LoginResponse = serde_json::from_value(json!({
            "token": "eyJhbGciOiJIUzI1NiJ9.e30.sig",
            "expiresAt": "2025-10-02T10:41:40Z",
            "username": "admin",
            "role": "Admin"
        }))
        .unwrap();

        assert_eq!(response.username.as_deref(), Some("admin"));
        assert_eq!(response.role.as_deref(), Some("Admin"));
        assert!(response.expires_at.is_some());
    }

    #[test]
    fn test_login_response_debug_hides_token() {
        let response: LoginResponse = serde_json::from_value(json!({"token": "secret-jwt"})).unwrap();
        let debug = format!("{response:?}");

        assert!(!debug.contains("secret-jwt"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_request_wire_names() {
        let body = serde_json::to_value(ChangePasswordRequest {
            current_password: "old",
            new_password: "new",
        })
        .unwrap();
        assert_eq!(body, json!({"current_password": "old", "new_password": "new"}));

        let body = serde_json::to_value(RegisterRequest {
            username: "jane",
            email: "jane@example.com",
            password: "pw",
            role: "User",
        })
        .unwrap();
        assert_eq!(body["role"], "User");
    }

    #[test]
    fn test_register_response_with_user() {
        let response: RegisterResponse = serde_json::from_value(json!({
            "message": "User registered",
            "user": {"id": 7, "username": "jane", "email": "jane@example.com", "role": "User"}
        }))
        .unwrap();

        let user = response.user.unwrap();
        assert_eq!(user.id, Some(7));
        assert_eq!(user.username, "jane");
    }
}
