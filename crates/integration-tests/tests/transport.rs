//! Transport behaviour over real HTTP: retries, classification, headers.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use axum::http::{Method, StatusCode};
use order_portal_client::notify::messages;
use order_portal_client::storage::keys;
use order_portal_client::{ApiError, ApiRequest, Storage, status_message};
use order_portal_integration_tests::{MockBackend, MockResponse, TestClient, unreachable_config};
use serde_json::json;

fn coefficients_body() -> serde_json::Value {
    json!({
        "finish": [{ "id": 1, "label": "Ra 3.2" }],
        "cover": [{ "id": "zinc", "label": "Цинкование" }],
        "tolerance": []
    })
}

fn profile_body() -> serde_json::Value {
    json!({
        "username": "buyer",
        "email": "buyer@example.com",
        "phone": "79991234567",
        "address": "101000, Москва, Москва, Тверская, 1, 5",
        "full_name": "Иванов Иван Иванович"
    })
}

#[tokio::test]
async fn test_server_errors_retry_then_fail() {
    let backend = MockBackend::start().await;
    backend.respond_sequence(
        Method::GET,
        "/coefficients",
        vec![
            MockResponse::text(503, "down"),
            MockResponse::text(503, "down"),
            MockResponse::text(503, "down"),
            MockResponse::json(200, coefficients_body()),
        ],
    );
    let test = TestClient::new(backend.config());

    let err = test.client.coefficients().get().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(backend.hits(Method::GET, "/coefficients"), 3);
    assert_eq!(
        test.sleeper.delays(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
    assert_eq!(test.notifier.notices().len(), 1);
    assert_eq!(
        test.notifier
            .count(&status_message(StatusCode::SERVICE_UNAVAILABLE)),
        1
    );
}

#[tokio::test]
async fn test_server_error_recovered_by_retry() {
    let backend = MockBackend::start().await;
    backend.respond_sequence(
        Method::GET,
        "/coefficients",
        vec![
            MockResponse::text(500, "oops"),
            MockResponse::json(200, coefficients_body()),
        ],
    );
    let test = TestClient::new(backend.config());

    let coefficients = test.client.coefficients().get().await.unwrap();

    assert_eq!(coefficients.finish[0].value, "1");
    assert_eq!(coefficients.cover[0].label, "Цинкование");
    assert_eq!(backend.hits(Method::GET, "/coefficients"), 2);
    assert!(test.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::GET,
        "/coefficients",
        MockResponse::json(404, json!({ "detail": "no such thing" })),
    );
    let test = TestClient::new(backend.config());

    let err = test.client.coefficients().get().await.unwrap_err();

    match err.root() {
        ApiError::Http {
            status,
            message,
            detail,
        } => {
            assert_eq!(*status, StatusCode::NOT_FOUND);
            assert_eq!(message, "Ресурс не найден");
            assert_eq!(detail.as_deref(), Some("no such thing"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(backend.hits(Method::GET, "/coefficients"), 1);
    assert!(test.sleeper.delays().is_empty());
}

#[tokio::test]
async fn test_unauthorized_ends_session_once() {
    let backend = MockBackend::start().await;
    backend.respond(Method::GET, "/profile", MockResponse::text(401, ""));
    let storage = std::sync::Arc::new(order_portal_client::MemoryStorage::new());
    storage.set(keys::TOKEN, "stored-token").unwrap();
    storage
        .set(keys::PROFILE, &profile_body().to_string())
        .unwrap();
    let test = TestClient::with_storage(backend.config(), storage);
    assert!(test.client.session().profile().is_some());

    let err = test.client.profile().fetch().await.unwrap_err();

    assert!(err.is_authentication());
    assert_eq!(backend.hits(Method::GET, "/profile"), 1);
    assert!(test.storage.get(keys::TOKEN).is_none());
    assert!(test.storage.get(keys::PROFILE).is_none());
    assert!(!test.client.session().is_authenticated());
    assert!(test.client.session().profile().is_none());
    assert_eq!(test.notifier.notices().len(), 1);
    assert_eq!(test.notifier.count(messages::SESSION_EXPIRED), 1);
    assert_eq!(test.navigator.home_count(), 1);
}

#[tokio::test]
async fn test_unauthorized_after_server_error_notifies_once() {
    let backend = MockBackend::start().await;
    backend.respond_sequence(
        Method::GET,
        "/profile",
        vec![MockResponse::text(502, ""), MockResponse::text(401, "")],
    );
    let test = TestClient::signed_in(backend.config(), "stored-token");

    let err = test.client.profile().fetch().await.unwrap_err();

    assert!(matches!(err, ApiError::Authentication));
    assert_eq!(backend.hits(Method::GET, "/profile"), 2);
    assert_eq!(test.notifier.notices().len(), 1);
    assert_eq!(test.notifier.count(messages::SESSION_EXPIRED), 1);
}

#[tokio::test]
async fn test_anonymous_unauthorized_keeps_session() {
    let backend = MockBackend::start().await;
    backend.respond(Method::GET, "/coefficients", MockResponse::text(401, ""));
    let test = TestClient::signed_in(backend.config(), "stored-token");

    let err = test.client.coefficients().get().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
    assert!(!err.is_authentication());
    assert!(test.client.session().is_authenticated());
    assert_eq!(test.navigator.home_count(), 0);
    assert_eq!(test.notifier.count("Необходима авторизация"), 1);
}

#[tokio::test]
async fn test_bearer_header_only_when_token_present() {
    let backend = MockBackend::start().await;
    backend.respond(Method::GET, "/profile", MockResponse::json(200, profile_body()));

    let anonymous = TestClient::new(backend.config());
    anonymous.client.profile().fetch().await.unwrap();
    assert!(backend.last_request("/profile").unwrap().authorization.is_none());

    let signed_in = TestClient::signed_in(backend.config(), "stored-token");
    signed_in.client.profile().fetch().await.unwrap();
    assert_eq!(
        backend.last_request("/profile").unwrap().authorization.as_deref(),
        Some("Bearer stored-token")
    );
}

#[tokio::test]
async fn test_validation_error_is_flagged() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::POST,
        "/orders",
        MockResponse::json(422, json!({ "detail": [{ "msg": "field required" }] })),
    );
    let test = TestClient::new(backend.config());

    let request = ApiRequest::post("/orders").json(&json!({})).unwrap();
    let err = test
        .client
        .transport()
        .fetch_json::<serde_json::Value>(&request)
        .await
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(test.notifier.count("Ошибка валидации данных"), 1);
}

#[tokio::test]
async fn test_network_failure_anonymous_is_swallowed() {
    let test = TestClient::new(unreachable_config().await);

    let response = test
        .client
        .transport()
        .execute(&ApiRequest::get("/coefficients"))
        .await
        .unwrap();

    assert!(response.is_none());
    assert_eq!(test.sleeper.delays().len(), 2);
    assert_eq!(test.notifier.notices().len(), 1);
    assert_eq!(test.notifier.count(messages::SERVER_UNREACHABLE), 1);
}

#[tokio::test]
async fn test_network_failure_authenticated_is_raised() {
    let test = TestClient::new(unreachable_config().await);

    let err = test
        .client
        .transport()
        .execute(&ApiRequest::get("/profile").authenticated())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
    assert_eq!(test.notifier.count(messages::SERVER_UNREACHABLE), 1);
}
