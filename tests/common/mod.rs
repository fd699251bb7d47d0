//! Shared helpers for the WireMock integration tests.

#![allow(dead_code)]

use reeve_client::{ReeveClient, ReeveClientBuilder};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token returned by the default login mock.
pub const TOKEN: &str = "T1";

/// Starts a mock server.
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// A builder pointed at the mock server.
pub fn builder(server: &MockServer) -> ReeveClientBuilder {
    ReeveClient::builder().api_url(server.uri())
}

/// A client authenticating with a static key.
pub fn api_key_client(server: &MockServer) -> ReeveClient {
    builder(server)
        .api_key("test-key")
        .build()
        .expect("Failed to build client")
}

/// A client logging in as `admin`.
pub fn password_client(server: &MockServer) -> ReeveClient {
    builder(server)
        .username("admin")
        .password("secret")
        .build()
        .expect("Failed to build client")
}

/// A successful envelope around `result`.
pub fn envelope(result: Value) -> Value {
    json!({
        "success": true,
        "error": null,
        "result": result,
        "statusCode": 200,
        "timestamp": "2024-05-01T12:00:00Z"
    })
}

/// A 200 response carrying a successful envelope.
pub fn success_response(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(envelope(result))
}

/// An error response carrying a failed envelope.
pub fn error_response(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({
        "success": false,
        "error": message,
        "result": null,
        "statusCode": status
    }))
}

/// Login result JSON.
pub fn login_result(token: &str) -> Value {
    json!({
        "token": token,
        "expiresAt": "2099-01-01T00:00:00Z",
        "username": "admin",
        "role": "Admin"
    })
}

/// Person JSON.
pub fn person(id: i64, firstname: &str, lastname: &str) -> Value {
    json!({
        "id": id,
        "firstname": firstname,
        "lastname": lastname,
        "createdAt": "2024-05-01T12:00:00Z"
    })
}

/// Mounts a login endpoint answering with `token`.
pub async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/Auth/login"))
        .respond_with(success_response(login_result(token)))
        .mount(server)
        .await;
}

/// Returns the Authorization header of every request sent to `route`.
pub async fn authorization_headers(server: &MockServer, route: &str) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == route)
        .map(|request| {
            request
                .headers
                .get("authorization")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .collect()
}
