//! Configuration module for the Reeve client.
//!
//! Covers the API base URL, the credentials used to obtain a bearer token,
//! connection pool sizing and the optional request timeout.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use url::Url;

use crate::errors::{ReeveError, ReeveResult};

/// Default number of idle connections kept per host.
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Credentials the client authenticates with.
#[derive(Clone, Default)]
pub enum Credentials {
    /// No credentials; only unauthenticated calls and explicit logins work.
    #[default]
    None,
    /// A pre-issued bearer token, used as-is.
    ApiKey(SecretString),
    /// Username and password, exchanged for a token on first use.
    Password {
        /// Username.
        username: String,
        /// Password.
        password: SecretString,
    },
}

impl Credentials {
    /// Returns the scheme name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::None => "none",
            Credentials::ApiKey(_) => "api_key",
            Credentials::Password { .. } => "password",
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::ApiKey(_) => f.debug_tuple("ApiKey").field(&"[REDACTED]").finish(),
            Credentials::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Configuration for the Reeve client.
#[derive(Clone)]
pub struct ReeveConfig {
    /// Base URL for API requests, without a trailing slash.
    pub api_url: String,
    /// Credentials.
    pub(crate) credentials: Credentials,
    /// Request timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Custom headers to include in requests.
    pub custom_headers: Vec<(String, String)>,
}

impl ReeveConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ReeveConfigBuilder {
        ReeveConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `REEVE_API_URL` (required): base URL of the API
    /// - `REEVE_API_KEY` (optional): pre-issued bearer token
    /// - `REEVE_USERNAME` / `REEVE_PASSWORD` (optional): login credentials
    /// - `REEVE_TIMEOUT` (optional): request timeout in seconds
    pub fn from_env() -> ReeveResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ReeveResult<Self> {
        let api_url = lookup("REEVE_API_URL")
            .ok_or_else(|| ReeveError::configuration("REEVE_API_URL environment variable not set"))?;

        let mut builder = ReeveConfigBuilder::new().api_url(api_url);

        if let Some(api_key) = lookup("REEVE_API_KEY") {
            builder = builder.api_key(api_key);
        }
        if let Some(username) = lookup("REEVE_USERNAME") {
            builder = builder.username(username);
        }
        if let Some(password) = lookup("REEVE_PASSWORD") {
            builder = builder.password(password);
        }

        if let Some(timeout_str) = lookup("REEVE_TIMEOUT") {
            let secs = timeout_str.trim().parse::<u64>().map_err(|_| {
                ReeveError::configuration(format!("REEVE_TIMEOUT is not a number: {timeout_str}"))
            })?;
            builder = builder.timeout_secs(secs);
        }

        builder.build()
    }

    /// Returns the credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}

impl std::fmt::Debug for ReeveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReeveConfig")
            .field("api_url", &self.api_url)
            .field("credentials", &self.credentials)
            .field("timeout", &self.timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .finish()
    }
}

/// Builder for `ReeveConfig`.
#[derive(Default)]
pub struct ReeveConfigBuilder {
    api_url: Option<String>,
    api_key: Option<String>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
    pool_max_idle_per_host: Option<usize>,
    custom_headers: Vec<(String, String)>,
}

impl ReeveConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL.
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Sets a pre-issued bearer token. Takes precedence over username and
    /// password.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the login username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }

    /// Sets the maximum idle connections kept per host.
    pub fn pool_max_idle_per_host(mut self, max_idle: usize) -> Self {
        self.pool_max_idle_per_host = Some(max_idle);
        self
    }

    /// Adds a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ReeveResult<ReeveConfig> {
        let api_url = self
            .api_url
            .ok_or_else(|| ReeveError::configuration("API URL is required"))?;
        let api_url = validate_api_url(&api_url)?;

        let credentials = resolve_credentials(self.api_key, self.username, self.password)?;

        if self.timeout == Some(Duration::ZERO) {
            return Err(ReeveError::configuration("Timeout must be greater than zero"));
        }

        Ok(ReeveConfig {
            api_url,
            credentials,
            timeout: self.timeout,
            pool_max_idle_per_host: self
                .pool_max_idle_per_host
                .unwrap_or(DEFAULT_POOL_MAX_IDLE_PER_HOST),
            custom_headers: self.custom_headers,
        })
    }
}

fn validate_api_url(raw: &str) -> ReeveResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)?;

    match url.scheme() {
        "https" => {}
        "http" => tracing::warn!(api_url = %trimmed, "API URL does not use HTTPS"),
        other => {
            return Err(ReeveError::configuration(format!(
                "API URL must use http or https, got {other}"
            )))
        }
    }

    if url.host_str().is_none() {
        return Err(ReeveError::configuration("API URL has no host"));
    }

    Ok(trimmed.to_string())
}

fn resolve_credentials(
    api_key: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> ReeveResult<Credentials> {
    if let Some(api_key) = api_key.filter(|k| !k.trim().is_empty()) {
        if username.is_some() || password.is_some() {
            tracing::debug!("API key configured; username and password are ignored");
        }
        return Ok(Credentials::ApiKey(SecretString::new(api_key)));
    }

    match (username, password) {
        (None, None) => Ok(Credentials::None),
        (Some(username), Some(password)) => {
            if username.trim().is_empty() || password.is_empty() {
                return Err(ReeveError::configuration(
                    "Username and password cannot be empty",
                ));
            }
            Ok(Credentials::Password {
                username,
                password: SecretString::new(password),
            })
        }
        (Some(_), None) => Err(ReeveError::configuration(
            "A username was configured without a password",
        )),
        (None, Some(_)) => Err(ReeveError::configuration(
            "A password was configured without a username",
        )),
    }
}

pub(crate) fn expose(secret: &SecretString) -> &str {
    secret.expose_secret()
}
