//! Authentication service.

use std::sync::Arc;
use tracing::instrument;

use crate::auth::SessionToken;
use crate::errors::{ReeveError, ReeveResult};
use crate::executor::RequestExecutor;
use crate::types::auth::{ChangePasswordRequest, RegisterRequest};
use crate::types::{ApiResponse, ChangePasswordResponse, LoginResponse, RegisterResponse};

/// Login, registration and password management.
#[derive(Debug, Clone)]
pub struct AuthService {
    executor: Arc<RequestExecutor>,
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(executor: Arc<RequestExecutor>) -> Self {
        Self { executor }
    }

    /// Logs in and stores the token for subsequent requests.
    ///
    /// On failure any previously stored token is kept.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> ReeveResult<ApiResponse<LoginResponse>> {
        self.executor.login(username, password).await
    }

    /// Registers a new user. Requires an admin token.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> ReeveResult<ApiResponse<RegisterResponse>> {
        if username.trim().is_empty() {
            return Err(ReeveError::validation("Username cannot be empty"));
        }
        if email.trim().is_empty() {
            return Err(ReeveError::validation("Email cannot be empty"));
        }
        if password.is_empty() {
            return Err(ReeveError::validation("Password cannot be empty"));
        }

        let body = RegisterRequest {
            username,
            email,
            password,
            role,
        };
        self.executor
            .post("auth.register", "Auth/register", &body)
            .await
    }

    /// Changes the password of the logged-in user.
    ///
    /// The stored token is not replaced.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ReeveResult<ApiResponse<ChangePasswordResponse>> {
        if current_password.is_empty() || new_password.is_empty() {
            return Err(ReeveError::validation(
                "Current and new password cannot be empty",
            ));
        }

        let body = ChangePasswordRequest {
            current_password,
            new_password,
        };
        self.executor
            .post("auth.change_password", "Auth/change-password", &body)
            .await
    }

    /// Fetches the service's view of the current token.
    ///
    /// The stored token is not replaced.
    #[instrument(skip(self))]
    pub async fn token(&self) -> ReeveResult<ApiResponse<LoginResponse>> {
        self.executor.get("auth.token", "Auth/token", &[]).await
    }

    /// Returns the token stored by the last successful login.
    pub fn current_token(&self) -> Option<SessionToken> {
        self.executor.tokens().current()
    }
}
