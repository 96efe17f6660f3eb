//! Login, registration and logout against the mock backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::Method;
use order_portal_client::storage::keys;
use order_portal_client::{ApiError, Credentials, MemoryStorage, Registration, Storage};
use order_portal_core::{Email, Phone};
use order_portal_integration_tests::{MockBackend, MockResponse, TestClient};
use secrecy::ExposeSecret;
use serde_json::json;

fn token_body(token: &str) -> serde_json::Value {
    json!({ "access_token": token, "token_type": "bearer" })
}

fn profile_body() -> serde_json::Value {
    json!({
        "username": "buyer",
        "email": "buyer@example.com",
        "phone": null,
        "address": "101000, Москва, Москва",
        "full_name": "Иванов Иван"
    })
}

#[tokio::test]
async fn test_login_stores_token_and_loads_profile() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/login", MockResponse::json(200, token_body("tok-1")));
    backend.respond(Method::GET, "/profile", MockResponse::json(200, profile_body()));
    let test = TestClient::new(backend.config());
    let token_rx = test.client.session().subscribe_token();

    test.client
        .auth()
        .login(&Credentials::new("buyer", "p&ss word"))
        .await
        .unwrap();

    assert!(token_rx.has_changed().unwrap());
    assert_eq!(test.client.auth().token().unwrap().expose_secret(), "tok-1");
    assert_eq!(test.storage.get(keys::TOKEN).as_deref(), Some("tok-1"));

    let login = backend.last_request("/login").unwrap();
    assert_eq!(
        login.content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(login.body_text(), "username=buyer&password=p%26ss%20word");
    assert!(login.authorization.is_none());

    let profile_request = backend.last_request("/profile").unwrap();
    assert_eq!(profile_request.authorization.as_deref(), Some("Bearer tok-1"));

    let profile = test.client.profile().current().unwrap();
    assert_eq!(profile.name_parts.first_name, "Иван");
    assert_eq!(profile.address_parts.city, "Москва");
    assert!(profile.phone.is_empty());
    assert!(test.storage.get(keys::PROFILE).is_some());
}

#[tokio::test]
async fn test_login_rejected_stays_anonymous() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::POST,
        "/login",
        MockResponse::json(401, json!({ "detail": "Incorrect username or password" })),
    );
    let test = TestClient::new(backend.config());

    let err = test
        .client
        .auth()
        .login(&Credentials::new("buyer", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Http { .. }));
    assert!(!test.client.auth().is_authenticated());
    assert_eq!(backend.hits(Method::GET, "/profile"), 0);
    assert_eq!(test.navigator.home_count(), 0);
    assert_eq!(test.notifier.count("Необходима авторизация"), 1);
}

#[tokio::test]
async fn test_login_survives_profile_failure() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/login", MockResponse::json(200, token_body("tok-2")));
    backend.respond(Method::GET, "/profile", MockResponse::text(404, ""));
    let test = TestClient::new(backend.config());

    test.client
        .auth()
        .login(&Credentials::new("buyer", "secret"))
        .await
        .unwrap();

    assert!(test.client.auth().is_authenticated());
    assert!(test.client.profile().current().is_none());
}

#[tokio::test]
async fn test_register_duplicate_by_status() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::POST,
        "/register",
        MockResponse::json(409, json!({ "detail": "User already exists" })),
    );
    let test = TestClient::new(backend.config());

    let err = test
        .client
        .auth()
        .register(&Registration::new(Credentials::new("buyer", "secret")))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::DuplicateUser(_)));
    assert!(!test.client.auth().is_authenticated());
    assert_eq!(test.notifier.notices().len(), 1);
    assert_eq!(test.notifier.count("User already exists"), 1);
}

#[tokio::test]
async fn test_register_other_failure_carries_detail() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::POST,
        "/register",
        MockResponse::json(400, json!({ "detail": "Bad field" })),
    );
    let test = TestClient::new(backend.config());

    let err = test
        .client
        .auth()
        .register(&Registration::new(Credentials::new("buyer", "secret")))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Registration(_)));
    assert_eq!(err.to_string(), "Bad field");
    assert_eq!(test.notifier.notices().len(), 1);
}

#[tokio::test]
async fn test_register_success_does_not_fetch_profile() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/register", MockResponse::json(200, token_body("tok-3")));
    let test = TestClient::new(backend.config());

    let mut registration = Registration::new(Credentials::new("buyer", "secret"));
    registration.email = Some(Email::parse("buyer@example.com").unwrap());
    registration.phone = Some(Phone::parse_lenient("+7 (999) 123-45-67").unwrap());
    test.client.auth().register(&registration).await.unwrap();

    assert_eq!(test.client.auth().token().unwrap().expose_secret(), "tok-3");
    assert_eq!(backend.hits(Method::GET, "/profile"), 0);

    let sent: serde_json::Value =
        serde_json::from_slice(&backend.last_request("/register").unwrap().body).unwrap();
    assert_eq!(
        sent,
        json!({
            "username": "buyer",
            "password": "secret",
            "email": "buyer@example.com",
            "phone": "79991234567"
        })
    );
}

#[tokio::test]
async fn test_logout_clears_everything_without_network() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/login", MockResponse::json(200, token_body("tok-4")));
    backend.respond(Method::GET, "/profile", MockResponse::json(200, profile_body()));
    let test = TestClient::new(backend.config());
    test.client
        .auth()
        .login(&Credentials::new("buyer", "secret"))
        .await
        .unwrap();
    let requests_before = backend.requests().len();

    test.client.logout();

    assert!(!test.client.auth().is_authenticated());
    assert!(test.client.profile().current().is_none());
    assert!(test.storage.get(keys::TOKEN).is_none());
    assert!(test.storage.get(keys::PROFILE).is_none());
    assert_eq!(backend.requests().len(), requests_before);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/login", MockResponse::json(200, token_body("tok-5")));
    backend.respond(Method::GET, "/profile", MockResponse::json(200, profile_body()));
    let storage = Arc::new(MemoryStorage::new());

    let first = TestClient::with_storage(backend.config(), Arc::clone(&storage));
    first
        .client
        .auth()
        .login(&Credentials::new("buyer", "secret"))
        .await
        .unwrap();
    drop(first);

    let second = TestClient::with_storage(backend.config(), storage);
    assert_eq!(second.client.auth().token().unwrap().expose_secret(), "tok-5");
    assert_eq!(
        second.client.profile().current().unwrap().name_parts.last_name,
        "Иванов"
    );
}
