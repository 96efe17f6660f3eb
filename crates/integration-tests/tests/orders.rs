//! Order payloads and uploads over real HTTP.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use axum::http::Method;
use order_portal_client::{ApiError, ApiRequest};
use order_portal_core::{DocumentId, FileId, OrderBase, OrderPayload};
use order_portal_integration_tests::{MockBackend, MockResponse, TestClient};
use serde_json::json;

fn sample_order() -> OrderPayload {
    OrderPayload {
        base: OrderBase {
            service_id: "cnc-lathe".into(),
            order_name: Some("Втулка".into()),
            file_id: FileId::new(42),
            quantity: 10,
            length: 120.0,
            width: 40.0,
            height: 40.0,
            material_id: "alum_D16T".into(),
            material_form: "rod".into(),
            tolerance_id: Some("IT12".into()),
            finish_id: None,
            cover_id: vec!["zinc".into()],
            procces_id: None,
            n_dimensions: Some(3),
            k_otk: "1".into(),
            k_cert: vec!["passport".into()],
            special_instructions: None,
            total_price_breakdown: None,
        },
        document_ids: vec![DocumentId::new(7)],
    }
}

#[tokio::test]
async fn test_order_payload_round_trips_through_backend() {
    let backend = MockBackend::start().await;
    backend.respond(Method::POST, "/orders", MockResponse::echo());
    let test = TestClient::signed_in(backend.config(), "tok");
    let order = sample_order();

    let request = ApiRequest::post("/orders").authenticated().json(&order).unwrap();
    let echoed: OrderPayload = test.client.transport().fetch_json(&request).await.unwrap();

    assert_eq!(echoed, order);
    let sent: serde_json::Value =
        serde_json::from_slice(&backend.last_request("/orders").unwrap().body).unwrap();
    assert_eq!(sent["file_id"], 42);
    assert!(sent.get("finish_id").is_none());
    assert_eq!(sent["document_ids"], json!([7]));
}

#[tokio::test]
async fn test_cad_upload_is_multipart() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::POST,
        "/files",
        MockResponse::json(200, json!({ "file_id": 42, "file_name": "bracket.step" })),
    );
    let test = TestClient::signed_in(backend.config(), "tok");

    let uploaded = test
        .client
        .files()
        .upload_cad_bytes("bracket.step", b"ISO-10303-21;".to_vec())
        .await
        .unwrap();

    assert_eq!(uploaded.id, FileId::new(42));
    assert_eq!(uploaded.filename, "bracket.step");

    let request = backend.last_request("/files").unwrap();
    assert_eq!(request.authorization.as_deref(), Some("Bearer tok"));
    assert!(
        request
            .content_type
            .as_deref()
            .unwrap()
            .starts_with("multipart/form-data; boundary=")
    );
    let body = request.body_text();
    assert!(body.contains(r#"name="file""#));
    assert!(body.contains(r#"filename="bracket.step""#));
    assert!(body.contains("ISO-10303-21;"));
}

#[tokio::test]
async fn test_document_upload_from_disk() {
    let backend = MockBackend::start().await;
    backend.respond(
        Method::POST,
        "/documents",
        MockResponse::json(200, json!({ "document_id": 7, "filename": "drawing.pdf" })),
    );
    let test = TestClient::signed_in(backend.config(), "tok");

    let dir = std::env::temp_dir().join(format!("portal-upload-{}", std::process::id()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let path = dir.join("drawing.pdf");
    tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();

    let uploaded = test.client.files().upload_document(&path).await.unwrap();
    tokio::fs::remove_dir_all(&dir).await.unwrap();

    assert_eq!(uploaded.id, DocumentId::new(7));
    assert!(backend
        .last_request("/documents")
        .unwrap()
        .body_text()
        .contains(r#"filename="drawing.pdf""#));
}

#[tokio::test]
async fn test_unsupported_cad_file_never_reaches_backend() {
    let backend = MockBackend::start().await;
    let test = TestClient::signed_in(backend.config(), "tok");

    let err = test
        .client
        .files()
        .upload_cad(Path::new("/nonexistent/notes.txt"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::File(_)));
    assert!(backend.requests().is_empty());
}
