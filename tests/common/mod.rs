//! Test helpers for HTTP integration tests.
//!
//! Builds a router over an in-memory index and a temporary storage root.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use tempfile::TempDir;

use docvault::config::WebConfig;
use docvault::document::{DocumentStorage, UploadPolicy};
use docvault::web::csrf::CsrfProtector;
use docvault::web::handlers::AppState;
use docvault::web::middleware::RateLimitState;
use docvault::web::router::create_router;
use docvault::Database;

/// Upload limit used by the default test app.
pub const TEST_MAX_UPLOAD_SIZE: u64 = 64 * 1024;

/// Minimal bytes that sniff as a PDF.
pub const PDF_BYTES: &[u8] = b"%PDF-1.4 fake content";

/// A running test app.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    /// Keeps the storage root alive for the duration of the test.
    pub temp: TempDir,
}

impl TestApp {
    /// Number of finished and partial files in the storage tree.
    pub fn stored_file_count(&self) -> usize {
        self.state.storage.entries().unwrap().len()
    }
}

/// Create a test configuration.
pub fn create_test_config() -> WebConfig {
    WebConfig {
        cors_origins: vec![],
        api_key: String::new(),
        csrf_secret: "test-csrf-secret-for-testing-only".to_string(),
        api_rate_limit: 10_000,
        upload_rate_limit: 10_000,
        serve_docs: false,
        serve_ui: true,
    }
}

/// Create a test app with default settings.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(create_test_config(), TEST_MAX_UPLOAD_SIZE).await
}

/// Create a test app with the given web config and upload limit.
pub async fn create_test_app_with(config: WebConfig, max_upload_size: u64) -> TestApp {
    let temp = TempDir::new().expect("Failed to create temp dir");

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let storage =
        DocumentStorage::new(temp.path().join("uploads")).expect("Failed to create storage");
    let csrf = CsrfProtector::new(&config.csrf_secret).expect("Failed to create CSRF protector");

    let state = Arc::new(AppState::new(
        db,
        storage,
        UploadPolicy::new(max_upload_size),
        csrf,
    ));
    let rate_limit_state = Arc::new(RateLimitState::new(
        config.api_rate_limit,
        config.upload_rate_limit,
    ));

    let router = create_router(state.clone(), rate_limit_state, &config)
        .expect("Failed to create router");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        state,
        temp,
    }
}

/// Multipart body with a single `file` field.
pub fn file_form(filename: &str, content: &[u8], mime: &str) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(content.to_vec())
            .file_name(filename.to_string())
            .mime_type(mime.to_string()),
    )
}

/// Upload a file through `POST /documents`.
pub async fn upload(server: &TestServer, filename: &str, content: &[u8]) -> TestResponse {
    server
        .post("/documents")
        .multipart(file_form(filename, content, "application/octet-stream"))
        .await
}

/// Upload a file and return the created document id.
pub async fn upload_ok(server: &TestServer, filename: &str, content: &[u8]) -> i64 {
    let response = upload(server, filename, content).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<serde_json::Value>()["id"].as_i64().unwrap()
}

/// Extract the CSRF token from the HTML page.
pub fn extract_csrf_token(html: &str) -> String {
    let marker = "name=\"csrf_token\" value=\"";
    let start = html.find(marker).expect("page has no CSRF token") + marker.len();
    let end = html[start..].find('"').expect("unterminated CSRF token") + start;
    html[start..end].to_string()
}
