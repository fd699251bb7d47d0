//! Request execution shared by every service.
//!
//! The executor attaches headers and the bearer token, sends through the
//! transport exactly once, and hands the raw response to the
//! [`ErrorMapper`]. It is also the only writer of the session token.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{field, Instrument};
use uuid::Uuid;

use crate::auth::{AuthProvider, SessionToken, TokenManager};
use crate::config::{expose, Credentials};
use crate::errors::{ErrorMapper, ReeveError, ReeveResult};
use crate::observability::{Observability, RequestTimer};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, MultipartPart, MultipartRequest};
use crate::types::auth::LoginRequest;
use crate::types::{ApiResponse, LoginResponse};

pub(crate) const LOGIN_PATH: &str = "Auth/login";

enum Outgoing {
    Plain(HttpRequest),
    Multipart(MultipartRequest),
}

impl Outgoing {
    fn method(&self) -> &'static str {
        match self {
            Outgoing::Plain(request) => request.method.as_str(),
            Outgoing::Multipart(_) => "POST",
        }
    }

    fn path(&self) -> &str {
        match self {
            Outgoing::Plain(request) => &request.path,
            Outgoing::Multipart(request) => &request.path,
        }
    }
}

/// Sends requests on behalf of the domain services.
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenManager>,
    credentials: Credentials,
    login_gate: tokio::sync::Mutex<()>,
    observability: Arc<Observability>,
    custom_headers: Vec<(String, String)>,
}

impl RequestExecutor {
    /// Creates an executor.
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenManager>,
        credentials: Credentials,
        observability: Arc<Observability>,
        custom_headers: Vec<(String, String)>,
    ) -> Self {
        Self {
            transport,
            tokens,
            credentials,
            login_gate: tokio::sync::Mutex::new(()),
            observability,
            custom_headers,
        }
    }

    /// Returns the token manager.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Returns the transport.
    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    /// Sends a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> ReeveResult<ApiResponse<T>> {
        let request = query
            .iter()
            .fold(HttpRequest::get(path), |request, (name, value)| {
                request.with_query(*name, value)
            });
        self.execute(operation, request).await
    }

    /// Sends a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> ReeveResult<ApiResponse<T>> {
        let request = HttpRequest::post(path).with_json(body)?;
        self.execute(operation, request).await
    }

    /// Sends a PUT request with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> ReeveResult<ApiResponse<T>> {
        let request = HttpRequest::put(path).with_json(body)?;
        self.execute(operation, request).await
    }

    /// Sends a DELETE request.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> ReeveResult<ApiResponse<T>> {
        self.execute(operation, HttpRequest::delete(path)).await
    }

    /// Sends a multipart POST request.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        parts: Vec<MultipartPart>,
    ) -> ReeveResult<ApiResponse<T>> {
        self.execute_multipart(operation, MultipartRequest::new(path, parts))
            .await
    }

    /// Sends an authenticated request, logging in first when needed.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: HttpRequest,
    ) -> ReeveResult<ApiResponse<T>> {
        self.ensure_authenticated().await?;
        self.dispatch(operation, Outgoing::Plain(request), true)
            .await
    }

    /// Sends an authenticated multipart request, logging in first when needed.
    pub async fn execute_multipart<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: MultipartRequest,
    ) -> ReeveResult<ApiResponse<T>> {
        self.ensure_authenticated().await?;
        self.dispatch(operation, Outgoing::Multipart(request), true)
            .await
    }

    /// Logs in and stores the returned token.
    ///
    /// The request carries no Authorization header. The stored token is only
    /// replaced on success.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> ReeveResult<ApiResponse<LoginResponse>> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ReeveError::validation(
                "Username and password are required to log in",
            ));
        }

        let request = HttpRequest::post(LOGIN_PATH).with_json(&LoginRequest { username, password })?;
        let result = self
            .dispatch::<LoginResponse>("auth.login", Outgoing::Plain(request), false)
            .await
            .and_then(|envelope| {
                let session = envelope
                    .result()
                    .filter(|login| !login.token.is_empty())
                    .map(SessionToken::from);

                match session {
                    Some(session) => {
                        self.tokens.store(session);
                        Ok(envelope)
                    }
                    None => Err(ReeveError::api(
                        "Login response carried no token",
                        envelope.status_code,
                    )),
                }
            });

        self.observability.record_login(result.is_ok());
        match &result {
            Ok(_) => tracing::info!(username, "Logged in"),
            Err(err) => tracing::warn!(username, error = %err, "Login failed"),
        }
        result
    }

    /// Performs the configured password login unless a session is held.
    ///
    /// Concurrent callers wait on one login instead of each sending their own.
    pub async fn ensure_authenticated(&self) -> ReeveResult<()> {
        let Credentials::Password { username, password } = &self.credentials else {
            return Ok(());
        };

        if self.tokens.has_session() {
            return Ok(());
        }

        let _gate = self.login_gate.lock().await;
        if self.tokens.has_session() {
            return Ok(());
        }

        tracing::debug!(username = %username, "No session token; logging in");
        self.login(username, expose(password)).await.map(|_| ())
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        operation: &str,
        outgoing: Outgoing,
        authenticated: bool,
    ) -> ReeveResult<ApiResponse<T>> {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            "reeve.request",
            operation,
            method = outgoing.method(),
            path = %outgoing.path(),
            request_id = %request_id,
            status = field::Empty,
            elapsed_ms = field::Empty,
        );

        async move {
            let timer = RequestTimer::start();
            let headers = self.headers(&request_id, authenticated);
            let log_config = self.observability.log_config();

            let sent = match outgoing {
                Outgoing::Plain(mut request) => {
                    if log_config.log_request_bodies {
                        if let Some(body) = &request.body {
                            tracing::debug!(body = %log_config.body_preview(body), "Request body");
                        }
                    }
                    request.headers.extend(headers);
                    self.transport.send(request).await
                }
                Outgoing::Multipart(mut request) => {
                    tracing::debug!(parts = request.parts.len(), "Sending multipart form");
                    request.headers.extend(headers);
                    self.transport.send_multipart(request).await
                }
            };

            let span = tracing::Span::current();
            span.record("elapsed_ms", timer.elapsed_ms());

            let response = match sent {
                Ok(response) => response,
                Err(err) => {
                    let err = ReeveError::from(err);
                    tracing::warn!(error = %err, "Request failed before a response arrived");
                    self.observability
                        .record_failure(operation, &err, timer.elapsed());
                    return Err(err);
                }
            };

            span.record("status", response.status);
            self.finish(operation, &response, &timer)
        }
        .instrument(span)
        .await
    }

    fn finish<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: &HttpResponse,
        timer: &RequestTimer,
    ) -> ReeveResult<ApiResponse<T>> {
        let log_config = self.observability.log_config();
        if log_config.log_response_bodies {
            tracing::debug!(body = %log_config.body_preview(&response.body), "Response body");
        }

        match ErrorMapper::parse_envelope::<T>(response) {
            Ok(envelope) => {
                tracing::debug!(status = response.status, "Request succeeded");
                self.observability
                    .record_success(operation, response.status, timer.elapsed());
                Ok(envelope)
            }
            Err(err) => {
                tracing::warn!(
                    status = response.status,
                    kind = %err.kind(),
                    error = %err,
                    "Request rejected"
                );
                self.observability
                    .record_failure(operation, &err, timer.elapsed());
                Err(err)
            }
        }
    }

    fn headers(&self, request_id: &str, authenticated: bool) -> HashMap<String, String> {
        let mut headers: HashMap<String, String> = self.custom_headers.iter().cloned().collect();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("X-Request-ID".to_string(), request_id.to_string());

        if authenticated {
            self.tokens.apply_auth(&mut headers);
        }

        headers
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("credentials", &self.credentials)
            .field("tokens", &self.tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::mocks::{fixtures, MockResponse, MockTransport};
    use crate::transport::{HttpMethod, TransportError};
    use async_trait::async_trait;
    use mockall::mock;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::{json, Value};

    fn executor_with(transport: Arc<dyn HttpTransport>, credentials: Credentials) -> RequestExecutor {
        let static_key = match &credentials {
            Credentials::ApiKey(key) => Some(key.clone()),
            _ => None,
        };

        RequestExecutor::new(
            transport,
            Arc::new(TokenManager::new(static_key)),
            credentials,
            Arc::new(Observability::default()),
            vec![("X-Tenant".to_string(), "acme".to_string())],
        )
    }

    fn password() -> Credentials {
        Credentials::Password {
            username: "admin".to_string(),
            password: SecretString::new("pw".to_string()),
        }
    }

    #[tokio::test]
    async fn test_headers_on_authenticated_request() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Get, "Person", MockResponse::envelope(json!([])));

        let executor = executor_with(
            transport.clone(),
            Credentials::ApiKey(SecretString::new("key-1".to_string())),
        );
        executor
            .get::<Vec<Value>>("person.list", "Person", &[])
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.header("Authorization"), Some("Bearer key-1"));
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.header("X-Tenant"), Some("acme"));
        assert!(Uuid::parse_str(request.header("X-Request-ID").unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_login_sends_no_authorization() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, LOGIN_PATH, MockResponse::envelope(fixtures::login("jwt-1")));

        let executor = executor_with(
            transport.clone(),
            Credentials::ApiKey(SecretString::new("key-1".to_string())),
        );
        executor.login("admin", "pw").await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.header("Authorization"), None);
        assert_eq!(
            request.body_json(),
            Some(json!({"username": "admin", "password": "pw"}))
        );

        let token = executor.tokens().current().unwrap();
        assert_eq!(token.token().expose_secret(), "jwt-1");
    }

    #[tokio::test]
    async fn test_failed_login_keeps_previous_token() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::envelope(fixtures::login("jwt-1")));
        transport.queue(MockResponse::error(401, "Invalid username or password"));

        let executor = executor_with(transport.clone(), Credentials::None);
        executor.login("admin", "pw").await.unwrap();

        let err = executor.login("admin", "wrong").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);

        let token = executor.tokens().current().unwrap();
        assert_eq!(token.token().expose_secret(), "jwt-1");
    }

    #[tokio::test]
    async fn test_login_without_token_is_api_error() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::envelope(Value::Null));

        let executor = executor_with(transport, Credentials::None);
        let err = executor.login("admin", "pw").await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert!(!executor.tokens().has_session());
    }

    #[tokio::test]
    async fn test_empty_credentials_rejected_locally() {
        let transport = Arc::new(MockTransport::new());
        let executor = executor_with(transport.clone(), Credentials::None);

        let err = executor.login("", "pw").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_password_credentials_log_in_once() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, LOGIN_PATH, MockResponse::envelope(fixtures::login("jwt-1")));
        transport.on(HttpMethod::Get, "Person", MockResponse::envelope(json!([])));

        let executor = executor_with(transport.clone(), password());
        executor.get::<Vec<Value>>("person.list", "Person", &[]).await.unwrap();
        executor.get::<Vec<Value>>("person.list", "Person", &[]).await.unwrap();

        assert_eq!(transport.requests_to(HttpMethod::Post, LOGIN_PATH).len(), 1);
        let list_calls = transport.requests_to(HttpMethod::Get, "Person");
        assert_eq!(list_calls.len(), 2);
        assert!(list_calls
            .iter()
            .all(|r| r.header("Authorization") == Some("Bearer jwt-1")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_share_one_login() {
        let transport = Arc::new(MockTransport::new());
        transport.on(
            HttpMethod::Post,
            LOGIN_PATH,
            MockResponse::envelope(fixtures::login("jwt-1"))
                .with_delay(std::time::Duration::from_millis(50)),
        );
        transport.on(HttpMethod::Get, "Person", MockResponse::envelope(json!([])));

        let executor = Arc::new(executor_with(transport.clone(), password()));
        let calls = (0..8).map(|_| {
            let executor = Arc::clone(&executor);
            async move {
                executor
                    .get::<Vec<Value>>("person.list", "Person", &[])
                    .await
            }
        });

        let results = futures::future::join_all(calls).await;
        assert!(results.iter().all(Result::is_ok));
        assert_eq!(transport.requests_to(HttpMethod::Post, LOGIN_PATH).len(), 1);
    }

    #[tokio::test]
    async fn test_auto_login_failure_surfaces() {
        let transport = Arc::new(MockTransport::new());
        transport.on(HttpMethod::Post, LOGIN_PATH, MockResponse::error(401, "Invalid credentials"));

        let executor = executor_with(transport.clone(), password());
        let err = executor
            .get::<Vec<Value>>("person.list", "Person", &[])
            .await
            .unwrap_err();

        assert!(err.is_authentication());
        assert!(transport.requests_to(HttpMethod::Get, "Person").is_empty());
    }

    #[tokio::test]
    async fn test_metrics_recorded() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(MockResponse::envelope(json!([])));
        transport.queue(MockResponse::error(404, "Person not found"));

        let executor = executor_with(transport, Credentials::None);
        executor.get::<Vec<Value>>("person.list", "Person", &[]).await.unwrap();
        executor
            .delete::<Value>("person.delete", "Person/9")
            .await
            .unwrap_err();

        let metrics = executor.observability.metrics().get_metrics();
        assert_eq!(metrics.successful_requests, 1);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.errors.get("not_found"), Some(&1));
    }

    mock! {
        Wire {}

        #[async_trait]
        impl HttpTransport for Wire {
            async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
            async fn send_multipart(&self, request: MultipartRequest) -> Result<HttpResponse, TransportError>;
            fn open(&self) -> Result<(), TransportError>;
            fn close(&self);
            fn is_open(&self) -> bool;
        }
    }

    #[tokio::test]
    async fn test_network_failure_is_single_attempt() {
        let mut transport = MockWire::new();
        transport.expect_send().times(1).returning(|_| {
            Err(TransportError::Connection {
                message: "connection refused".to_string(),
            })
        });

        let executor = executor_with(Arc::new(transport), Credentials::None);
        let err = executor
            .get::<Vec<Value>>("person.list", "Person", &[])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), None);
        assert!(err.message().contains("connection refused"));
    }
}
