//! Integration tests for person management.

mod common;

use common::*;
use reeve_client::{ErrorKind, PersonUpdate};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::Mock;

#[tokio::test]
async fn test_add_then_list_contains_person() {
    let server = setup_mock_server().await;
    mount_login(&server, "T1").await;
    Mock::given(method("POST"))
        .and(path("/Person"))
        .and(header("Authorization", "Bearer T1"))
        .and(body_json(json!({"firstname": "John", "lastname": "Doe"})))
        .respond_with(success_response(person(12, "John", "Doe")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Person"))
        .respond_with(success_response(json!([
            person(3, "Amy", "Pond"),
            person(12, "John", "Doe")
        ])))
        .mount(&server)
        .await;

    let client = password_client(&server);
    let session = client.open().await.unwrap();

    let created = session
        .person()
        .add(Some("John"), Some("Doe"))
        .await
        .unwrap()
        .into_result()
        .unwrap();
    let persons = session.person().list().await.unwrap().into_result().unwrap();

    assert_eq!(created.id, 12);
    assert!(persons.iter().any(|p| p.id == created.id));
    assert_eq!(persons[0].id, 3);
}

#[tokio::test]
async fn test_list_accepts_space_separated_timestamps() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/Person"))
        .respond_with(success_response(json!([
            {"id": 1, "firstname": "Ada", "createdAt": "2025-06-01 09:15:00"},
            person(2, "Amy", "Pond")
        ])))
        .mount(&server)
        .await;

    let client = api_key_client(&server);
    let persons = client.person().list().await.unwrap().into_result().unwrap();

    let created = persons[0].created_at.unwrap();
    assert_eq!(created.to_rfc3339(), "2025-06-01T09:15:00+00:00");
    assert_eq!(persons.len(), 2);
}

#[tokio::test]
async fn test_add_person_without_names() {
    let server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path("/Person"))
        .and(body_json(json!({})))
        .respond_with(success_response(json!({"id": 4})))
        .mount(&server)
        .await;

    let client = api_key_client(&server);
    let created = client.person().add(None, None).await.unwrap().into_result().unwrap();

    assert_eq!(created.id, 4);
    assert_eq!(created.full_name(), "");
}

#[tokio::test]
async fn test_list_page() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/Person"))
        .and(query_param("Page", "2"))
        .and(query_param("Amount", "10"))
        .respond_with(success_response(json!([person(11, "Ada", "King")])))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_key_client(&server);
    let page = client.person().list_page(2, 10).await.unwrap().into_result().unwrap();

    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_edit_person() {
    let server = setup_mock_server().await;
    Mock::given(method("PUT"))
        .and(path("/Person/12"))
        .and(body_json(json!({"id": 12, "lastname": "Smith"})))
        .respond_with(success_response(person(12, "John", "Smith")))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_key_client(&server);
    let updated = client
        .person()
        .edit(12, &PersonUpdate::new().lastname("Smith"))
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(updated.full_name(), "John Smith");
}

#[tokio::test]
async fn test_delete_twice_is_not_found() {
    let server = setup_mock_server().await;
    Mock::given(method("DELETE"))
        .and(path("/Person/12"))
        .respond_with(success_response(json!({"message": "Person deleted"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/Person/12"))
        .respond_with(error_response(404, "Person not found"))
        .mount(&server)
        .await;

    let client = api_key_client(&server);
    client.person().delete(12).await.unwrap();
    let err = client.person().delete(12).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "Person not found");
}

#[tokio::test]
async fn test_expired_token_is_authentication_error() {
    let server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/Person"))
        .respond_with(error_response(401, "Token expired"))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_key_client(&server);
    let err = client.person().list().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Authentication);
}
