//! Web API Document Tests
//!
//! Integration tests for the `/documents` endpoints.

mod common;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use common::{
    create_test_app, create_test_app_with, create_test_config, file_form, upload, upload_ok,
    PDF_BYTES,
};
use docvault::web::middleware::API_KEY_HEADER;
use serde_json::Value;

fn error_code(body: &Value) -> &str {
    body["error"]["code"].as_str().unwrap()
}

fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap()
}

// ============================================================================
// Upload Tests
// ============================================================================

#[tokio::test]
async fn test_upload_pdf() {
    let app = create_test_app().await;

    let response = upload(&app.server, "test.pdf", PDF_BYTES).await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["filename"], "test.pdf");
    assert_eq!(body["content_type"], "application/pdf");
    assert_eq!(body["size"].as_u64().unwrap(), PDF_BYTES.len() as u64);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert!(body["upload_timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(body.get("storage_path").is_none());
    assert_eq!(app.stored_file_count(), 1);
}

#[tokio::test]
async fn test_upload_txt() {
    let app = create_test_app().await;

    let response = upload(&app.server, "notes.txt", b"hello world\n").await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["content_type"], "text/plain");
    assert_eq!(body["size"], 12);
}

#[tokio::test]
async fn test_upload_txt_starting_like_a_binary_signature() {
    let app = create_test_app().await;

    for (name, content) in [
        ("bmi.txt", "BMI results for Q3\n"),
        ("mz700.txt", "MZ-700 owner notes\n"),
        ("id3.txt", "ID3 tags explained\n"),
    ] {
        let response = upload(&app.server, name, content.as_bytes()).await;

        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()["content_type"], "text/plain");
    }
    assert_eq!(app.stored_file_count(), 3);
}

#[tokio::test]
async fn test_upload_docx_as_zip_container() {
    let app = create_test_app().await;
    let mut content = b"PK\x03\x04".to_vec();
    content.extend_from_slice(&[0u8; 64]);

    let response = upload(&app.server, "report.DOCX", &content).await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["content_type"], docvault::document::DOCX_MIME);
}

#[tokio::test]
async fn test_upload_path_traversal_is_sanitized() {
    let app = create_test_app().await;

    let response = upload(&app.server, "../../etc/evil.pdf", PDF_BYTES).await;

    response.assert_status(StatusCode::CREATED);
    let filename = response.json::<Value>()["filename"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(!filename.contains('/'));
    assert!(!filename.contains(".."));
    assert!(filename.ends_with(".pdf"));

    // Nothing escaped the storage root.
    assert!(!app.temp.path().join("etc").exists());
}

#[tokio::test]
async fn test_upload_content_mismatch() {
    let app = create_test_app().await;

    let response = upload(&app.server, "fake.pdf", b"This is just plain text...").await;

    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = response.json::<Value>();
    assert_eq!(error_code(&body), "UNSUPPORTED_MEDIA_TYPE");
    assert!(error_message(&body).contains("does not match"));
    assert!(error_message(&body).contains("text/plain"));
    assert_eq!(app.stored_file_count(), 0);
}

#[tokio::test]
async fn test_upload_unsupported_extension() {
    let app = create_test_app().await;

    let response = upload(&app.server, "script.exe", b"MZ\x90\x00").await;

    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let message = error_message(&response.json::<Value>()).to_string();
    assert!(message.contains(".exe"));
    assert!(message.contains(".pdf"));
}

#[tokio::test]
async fn test_upload_without_extension() {
    let app = create_test_app().await;

    let response = upload(&app.server, "README", b"text").await;

    response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_upload_empty_file() {
    let app = create_test_app().await;

    let response = upload(&app.server, "empty.pdf", b"").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&response.json::<Value>()), "File must not be empty");
    assert_eq!(app.stored_file_count(), 0);
}

#[tokio::test]
async fn test_upload_too_large() {
    let app = create_test_app_with(create_test_config(), 1024).await;
    let mut content = b"%PDF-1.4 ".to_vec();
    content.resize(2048, b'x');

    let response = upload(&app.server, "big.pdf", &content).await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_code(&response.json::<Value>()), "PAYLOAD_TOO_LARGE");
    assert_eq!(app.stored_file_count(), 0);
}

#[tokio::test]
async fn test_upload_at_exact_limit() {
    let app = create_test_app_with(create_test_config(), 1024).await;
    let mut content = b"%PDF-1.4 ".to_vec();
    content.resize(1024, b'x');

    let response = upload(&app.server, "exact.pdf", &content).await;

    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_upload_missing_file_field() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/documents")
        .multipart(MultipartForm::new().add_text("other", "value"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&response.json::<Value>()),
        "Filename is required"
    );
}

#[tokio::test]
async fn test_upload_empty_filename() {
    let app = create_test_app().await;

    let response = app
        .server
        .post("/documents")
        .multipart(file_form("", PDF_BYTES, "application/pdf"))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// List Tests
// ============================================================================

#[tokio::test]
async fn test_list_empty() {
    let app = create_test_app().await;

    let response = app.server.get("/documents").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["documents"].as_array().unwrap().len(), 0);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 10);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_list_pagination() {
    let app = create_test_app().await;
    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(upload_ok(&app.server, &format!("doc{i}.txt"), b"content").await);
    }

    let response = app
        .server
        .get("/documents")
        .add_query_param("page", 2)
        .add_query_param("page_size", 2)
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    let documents = body["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["page_size"], 2);

    // Newest first: page 2 holds the third and fourth newest.
    assert_eq!(documents[0]["id"].as_i64().unwrap(), ids[2]);
    assert_eq!(documents[1]["id"].as_i64().unwrap(), ids[1]);
}

#[tokio::test]
async fn test_list_page_past_end() {
    let app = create_test_app().await;
    upload_ok(&app.server, "one.txt", b"one").await;

    let response = app
        .server
        .get("/documents")
        .add_query_param("page", 99)
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert!(body["documents"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_list_invalid_pagination() {
    let app = create_test_app().await;

    let response = app.server.get("/documents").add_query_param("page", 0).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .get("/documents")
        .add_query_param("page_size", 101)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .get("/documents")
        .add_query_param("page", "abc")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Get / Download / Delete Tests
// ============================================================================

#[tokio::test]
async fn test_get_document() {
    let app = create_test_app().await;
    let id = upload_ok(&app.server, "test.pdf", PDF_BYTES).await;

    let response = app.server.get(&format!("/documents/{id}")).await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["id"].as_i64().unwrap(), id);
    assert_eq!(body["filename"], "test.pdf");
}

#[tokio::test]
async fn test_get_document_not_found() {
    let app = create_test_app().await;

    let response = app.server.get("/documents/999").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert_eq!(error_code(&body), "NOT_FOUND");
    assert_eq!(error_message(&body), "Document not found");
}

#[tokio::test]
async fn test_download_document() {
    let app = create_test_app().await;
    let id = upload_ok(&app.server, "test.pdf", PDF_BYTES).await;

    let response = app.server.get(&format!("/documents/{id}/download")).await;

    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), PDF_BYTES);
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"test.pdf\""
    );
}

#[tokio::test]
async fn test_download_missing_file() {
    let app = create_test_app().await;
    let id = upload_ok(&app.server, "test.pdf", PDF_BYTES).await;

    let repo = app.state.repository();
    let service = docvault::DocumentService::new(&app.state.policy, &app.state.storage, &repo);
    let doc = service.get(id).await.unwrap();
    app.state.storage.delete(&doc.storage_path).unwrap();

    let response = app.server.get(&format!("/documents/{id}/download")).await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_document() {
    let app = create_test_app().await;
    let id = upload_ok(&app.server, "test.pdf", PDF_BYTES).await;
    assert_eq!(app.stored_file_count(), 1);

    let response = app.server.delete(&format!("/documents/{id}")).await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = app.server.get(&format!("/documents/{id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(app.stored_file_count(), 0);

    let response = app.server.delete(&format!("/documents/{id}")).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ids_not_reused_after_delete() {
    let app = create_test_app().await;
    let first = upload_ok(&app.server, "a.txt", b"a").await;
    app.server
        .delete(&format!("/documents/{first}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let second = upload_ok(&app.server, "b.txt", b"b").await;

    assert!(second > first);
}

// ============================================================================
// API Key Tests
// ============================================================================

#[tokio::test]
async fn test_api_key_required() {
    let mut config = create_test_config();
    config.api_key = "secret-key".to_string();
    let app = create_test_app_with(config, common::TEST_MAX_UPLOAD_SIZE).await;

    let response = app.server.get("/documents").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&response.json::<Value>()), "UNAUTHORIZED");

    let response = app
        .server
        .get("/documents")
        .add_header(API_KEY_HEADER, "wrong-key")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .get("/documents")
        .add_header(API_KEY_HEADER, "secret-key")
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_api_key_does_not_guard_health() {
    let mut config = create_test_config();
    config.api_key = "secret-key".to_string();
    let app = create_test_app_with(config, common::TEST_MAX_UPLOAD_SIZE).await;

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    response.assert_text("OK");
}

// ============================================================================
// Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_security_headers_on_api() {
    let app = create_test_app().await;

    let response = app.server.get("/documents").await;

    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");
    assert_eq!(response.header("cache-control"), "no-store");
}

#[tokio::test]
async fn test_upload_rate_limit() {
    let mut config = create_test_config();
    config.upload_rate_limit = 2;
    let app = create_test_app_with(config, common::TEST_MAX_UPLOAD_SIZE).await;

    upload(&app.server, "a.txt", b"a")
        .await
        .assert_status(StatusCode::CREATED);
    upload(&app.server, "b.txt", b"b")
        .await
        .assert_status(StatusCode::CREATED);

    let response = upload(&app.server, "c.txt", b"c").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);

    // Reads are still allowed.
    app.server.get("/documents").await.assert_status_ok();
}
