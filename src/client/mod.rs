//! Reeve API client.
//!
//! Provides the main client interface for interacting with the Reeve API.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{SessionToken, TokenManager};
use crate::config::{Credentials, ReeveConfig, ReeveConfigBuilder};
use crate::errors::ReeveResult;
use crate::executor::RequestExecutor;
use crate::observability::{LogConfig, MetricsCollector, Observability, ObservabilityConfig};
use crate::services::{AuthService, FaceService, PersonService, SubjectService};
use crate::transport::{HttpTransport, HttpTransportImpl, TransportSettings};

/// The main Reeve client.
///
/// All services share one executor, one connection pool and one token.
///
/// # Example
///
/// ```rust,no_run
/// use reeve_client::{FaceImage, ReeveClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ReeveClient::builder()
///         .api_url("https://reeve.example.com/api")
///         .username("admin")
///         .password("secret")
///         .build()?;
///
///     let session = client.open().await?;
///     let person = session.person().add(Some("John"), Some("Doe")).await?.into_result()?;
///     let image = FaceImage::jpeg(std::fs::read("john.jpg")?);
///     session.face().add(person.id, image).await?;
///     Ok(())
/// }
/// ```
pub struct ReeveClient {
    config: ReeveConfig,
    executor: Arc<RequestExecutor>,
    auth_service: AuthService,
    person_service: PersonService,
    face_service: FaceService,
    subject_service: SubjectService,
    observability: Arc<Observability>,
    sessions: AtomicUsize,
}

impl ReeveClient {
    /// Creates a new client builder.
    pub fn builder() -> ReeveClientBuilder {
        ReeveClientBuilder::new()
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `REEVE_API_URL` and optionally `REEVE_API_KEY`,
    /// `REEVE_USERNAME`, `REEVE_PASSWORD` and `REEVE_TIMEOUT`.
    pub fn from_env() -> ReeveResult<Self> {
        let config = ReeveConfig::from_env()?;
        ReeveClientBuilder::from_config(config).build()
    }

    /// Opens the connection pool and logs in with the configured username
    /// and password, if any.
    ///
    /// Sessions may overlap; the client is closed when the last guard is
    /// dropped. If the login fails and no other session is open, the pool is
    /// closed again before the error is returned.
    pub async fn open(&self) -> ReeveResult<ReeveSession<'_>> {
        self.executor.transport().open()?;

        self.sessions.fetch_add(1, Ordering::AcqRel);
        let session = ReeveSession { client: self };
        self.executor.ensure_authenticated().await?;

        tracing::info!(
            api_url = %self.config.api_url,
            credentials = self.config.credentials().kind(),
            "Session opened"
        );
        Ok(session)
    }

    /// Closes the connection pool and drops the session token.
    ///
    /// The client stays usable: the next call reopens the pool, logging in
    /// again when password credentials are configured.
    pub fn close(&self) {
        self.executor.transport().close();
        self.executor.tokens().clear_session();
        tracing::debug!(api_url = %self.config.api_url, "Client closed");
    }

    /// Returns true while the connection pool is open.
    pub fn is_open(&self) -> bool {
        self.executor.transport().is_open()
    }

    /// Returns the authentication service.
    pub fn auth(&self) -> &AuthService {
        &self.auth_service
    }

    /// Returns the person service.
    pub fn person(&self) -> &PersonService {
        &self.person_service
    }

    /// Returns the face service.
    pub fn face(&self) -> &FaceService {
        &self.face_service
    }

    /// Returns the subject service.
    pub fn subject(&self) -> &SubjectService {
        &self.subject_service
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReeveConfig {
        &self.config
    }

    /// Returns the observability facade.
    pub fn observability(&self) -> &Observability {
        &self.observability
    }

    /// Returns the token stored by the last successful login.
    pub fn current_token(&self) -> Option<SessionToken> {
        self.executor.tokens().current()
    }
}

impl std::fmt::Debug for ReeveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReeveClient")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .finish()
    }
}

/// An open client. Dropping the last open session closes the client.
#[must_use = "dropping the session may close the client immediately"]
pub struct ReeveSession<'a> {
    client: &'a ReeveClient,
}

impl ReeveSession<'_> {
    /// Closes the session now.
    pub fn close(self) {
        drop(self);
    }
}

impl Deref for ReeveSession<'_> {
    type Target = ReeveClient;

    fn deref(&self) -> &ReeveClient {
        self.client
    }
}

impl Drop for ReeveSession<'_> {
    fn drop(&mut self) {
        if self.client.sessions.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.client.close();
        }
    }
}

impl std::fmt::Debug for ReeveSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReeveSession")
            .field("client", self.client)
            .finish()
    }
}

/// Builder for the Reeve client.
pub struct ReeveClientBuilder {
    config_builder: ReeveConfigBuilder,
    config: Option<ReeveConfig>,
    transport: Option<Arc<dyn HttpTransport>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    log_config: LogConfig,
    enable_metrics: bool,
}

impl ReeveClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config_builder: ReeveConfigBuilder::new(),
            config: None,
            transport: None,
            metrics: None,
            log_config: LogConfig::default(),
            enable_metrics: true,
        }
    }

    /// Creates a builder from an existing configuration. Configuration
    /// setters on the builder are then ignored.
    pub fn from_config(config: ReeveConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::new()
        }
    }

    /// Sets the API base URL.
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_url(api_url);
        self
    }

    /// Sets a pre-issued bearer token.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.api_key(api_key);
        self
    }

    /// Sets the login username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.username(username);
        self
    }

    /// Sets the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.password(password);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config_builder = self.config_builder.timeout_secs(secs);
        self
    }

    /// Sets the maximum idle connections kept per host.
    pub fn pool_max_idle_per_host(mut self, max_idle: usize) -> Self {
        self.config_builder = self.config_builder.pool_max_idle_per_host(max_idle);
        self
    }

    /// Adds a header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.header(name, value);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom metrics collector.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Disables metrics collection.
    pub fn disable_metrics(mut self) -> Self {
        self.enable_metrics = false;
        self
    }

    /// Sets the log configuration.
    pub fn log_config(mut self, config: LogConfig) -> Self {
        self.log_config = config;
        self
    }

    /// Builds the client.
    pub fn build(self) -> ReeveResult<ReeveClient> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_builder.build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransportImpl::new(TransportSettings {
                base_url: config.api_url.clone(),
                timeout: config.timeout,
                pool_max_idle_per_host: config.pool_max_idle_per_host,
            })),
        };

        let static_key = match config.credentials() {
            Credentials::ApiKey(key) => Some(key.clone()),
            Credentials::None | Credentials::Password { .. } => None,
        };
        let tokens = Arc::new(TokenManager::new(static_key));

        let observability_config = ObservabilityConfig {
            logging: self.log_config,
            enable_metrics: self.enable_metrics,
        };
        let observability = Arc::new(match self.metrics {
            Some(metrics) => Observability::with_metrics(metrics, observability_config),
            None => Observability::new(observability_config),
        });

        let executor = Arc::new(RequestExecutor::new(
            transport,
            tokens,
            config.credentials().clone(),
            Arc::clone(&observability),
            config.custom_headers.clone(),
        ));

        Ok(ReeveClient {
            auth_service: AuthService::new(Arc::clone(&executor)),
            person_service: PersonService::new(Arc::clone(&executor)),
            face_service: FaceService::new(Arc::clone(&executor)),
            subject_service: SubjectService::new(Arc::clone(&executor)),
            executor,
            observability,
            config,
            sessions: AtomicUsize::new(0),
        })
    }
}

impl Default for ReeveClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::mocks::{fixtures, MockResponse, MockTransport};
    use crate::transport::HttpMethod;
    use serde_json::json;

    const API_URL: &str = "https://reeve.example.com";

    fn client_with(transport: &Arc<MockTransport>, builder: ReeveClientBuilder) -> ReeveClient {
        builder
            .api_url(API_URL)
            .transport(transport.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_api_url() {
        let result = ReeveClientBuilder::new().api_key("key").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_with_default_transport() {
        let client = ReeveClient::builder()
            .api_url(API_URL)
            .api_key("key")
            .build()
            .unwrap();

        assert!(!client.is_open());
        assert_eq!(client.config().api_url, API_URL);
    }

    #[tokio::test]
    async fn test_open_logs_in_and_drop_closes() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, "Auth/login", MockResponse::envelope(fixtures::login("T1")));

        let client = client_with(&transport, ReeveClient::builder().username("admin").password("pw"));

        {
            let session = client.open().await.unwrap();
            assert!(session.is_open());
            assert!(session.current_token().is_some());
        }

        assert!(!client.is_open());
        assert!(client.current_token().is_none());
        assert_eq!(transport.open_count(), 1);
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_overlapping_sessions_close_on_last_drop() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, "Auth/login", MockResponse::envelope(fixtures::login("T1")));
        transport.on(HttpMethod::Get, "Person", MockResponse::envelope(json!([])));

        let client = client_with(&transport, ReeveClient::builder().username("admin").password("pw"));
        let first = client.open().await.unwrap();
        let second = client.open().await.unwrap();

        first.close();
        assert!(client.is_open());
        assert!(client.current_token().is_some());
        second.person().list().await.unwrap();

        second.close();
        assert!(!client.is_open());
        assert!(client.current_token().is_none());
        assert_eq!(transport.requests_to(HttpMethod::Post, "Auth/login").len(), 1);
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_login_closes_pool() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, "Auth/login", MockResponse::error(401, "Invalid credentials"));

        let client = client_with(&transport, ReeveClient::builder().username("admin").password("bad"));
        let err = client.open().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(!client.is_open());
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_api_key_takes_precedence() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Get, "Person", MockResponse::envelope(json!([])));

        let client = client_with(
            &transport,
            ReeveClient::builder()
                .api_key("key-1")
                .username("admin")
                .password("pw"),
        );

        let session = client.open().await.unwrap();
        session.person().list().await.unwrap();

        assert!(transport.requests_to(HttpMethod::Post, "Auth/login").is_empty());
        assert_eq!(
            transport.last_request().unwrap().header("Authorization"),
            Some("Bearer key-1")
        );
    }

    #[tokio::test]
    async fn test_session_closes_on_early_return() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Delete, "Person/1", MockResponse::error(404, "Person not found"));

        let client = client_with(&transport, ReeveClient::builder().api_key("key"));

        async fn run(client: &ReeveClient) -> ReeveResult<()> {
            let session = client.open().await?;
            session.person().delete(1).await?;
            Ok(())
        }

        assert!(run(&client).await.is_err());
        assert!(!client.is_open());
    }

    #[tokio::test]
    async fn test_closed_client_reopens_lazily() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, "Auth/login", MockResponse::envelope(fixtures::login("T1")));
        transport.on(HttpMethod::Get, "Person", MockResponse::envelope(json!([])));

        let client = client_with(&transport, ReeveClient::builder().username("admin").password("pw"));
        client.open().await.unwrap().close();

        client.person().list().await.unwrap();
        assert!(client.is_open());
        assert_eq!(transport.requests_to(HttpMethod::Post, "Auth/login").len(), 2);
    }
}
