//! Document handlers for the HTTP API.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::document::{DocumentService, Download, Rejection, UploadOutcome};
use crate::web::csrf::CSRF_FIELD;
use crate::web::dto::{DocumentListResponse, DocumentResponse, ListDocumentsQuery, ValidatedQuery};
use crate::web::error::{ApiError, ErrorBody, ErrorCode};
use crate::web::handlers::AppState;

/// Multipart body of an upload, for the OpenAPI document.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// The document.
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// Fields of interest in an upload form.
#[derive(Debug, Default)]
pub struct MultipartUpload {
    /// Whether a `file` field was present.
    pub has_file: bool,
    /// Client filename of the `file` field.
    pub filename: Option<String>,
    /// Content of the `file` field.
    pub content: Vec<u8>,
    /// `csrf_token` field, used by the HTML form.
    pub csrf_token: Option<String>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    tracing::warn!("Failed to read multipart body: {}", e);
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(ErrorCode::PayloadTooLarge, "Request body too large")
    } else {
        ApiError::bad_request("Invalid multipart data")
    }
}

/// Read the `file` and `csrf_token` fields of a multipart body.
pub async fn read_multipart_upload(multipart: &mut Multipart) -> Result<MultipartUpload, ApiError> {
    let mut upload = MultipartUpload::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or("") {
            "file" => {
                upload.has_file = true;
                upload.filename = field.file_name().map(|s| s.to_string());
                upload.content = field.bytes().await.map_err(multipart_error)?.to_vec();
            }
            CSRF_FIELD => {
                upload.csrf_token = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// Generate a safe Content-Disposition header value for downloads.
///
/// Control characters are removed, quotes and backslashes are replaced in
/// the plain `filename` parameter, and non-ASCII names also get an RFC 5987
/// `filename*` parameter.
pub fn content_disposition_header(filename: &str) -> String {
    let needs_encoding =
        !filename.is_ascii() || filename.chars().any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let fallback: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

/// Build the response for a download.
pub fn download_response(download: Download) -> Response {
    let Download { document, content } = download;
    (
        [
            (header::CONTENT_TYPE, document.content_type),
            (
                header::CONTENT_DISPOSITION,
                content_disposition_header(&document.filename),
            ),
        ],
        content,
    )
        .into_response()
}

/// POST /documents - Upload a document.
#[utoipa::path(
    post,
    path = "/documents",
    tag = "documents",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Missing filename or empty file", body = ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 415, description = "Unsupported type or content mismatch", body = ErrorBody),
        (status = 500, description = "Storage or index failure", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    let upload = read_multipart_upload(&mut multipart).await?;
    if !upload.has_file {
        return Err(Rejection::FilenameRequired.into());
    }

    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);

    match service
        .upload(upload.filename.as_deref(), &upload.content)
        .await?
    {
        UploadOutcome::Accepted(doc) => Ok((StatusCode::CREATED, Json(doc.into()))),
        UploadOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// GET /documents - List documents, newest first.
#[utoipa::path(
    get,
    path = "/documents",
    tag = "documents",
    params(ListDocumentsQuery),
    responses(
        (status = 200, description = "One page of documents", body = DocumentListResponse),
        (status = 400, description = "Invalid pagination", body = ErrorBody),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ListDocumentsQuery>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);

    let page = service.list(query.page, query.page_size).await?;
    Ok(Json(page.into()))
}

/// GET /documents/:id - Get document metadata.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    tag = "documents",
    params(("id" = i64, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document metadata", body = DocumentResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 404, description = "Document not found", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);

    let doc = service.get(id).await?;
    Ok(Json(doc.into()))
}

/// GET /documents/:id/download - Download document content.
#[utoipa::path(
    get,
    path = "/documents/{id}/download",
    tag = "documents",
    params(("id" = i64, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document content with its stored content type"),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 404, description = "Document or file not found", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);

    Ok(download_response(service.download(id).await?))
}

/// DELETE /documents/:id - Delete a document.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "documents",
    params(("id" = i64, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 401, description = "Missing or invalid API key", body = ErrorBody),
        (status = 404, description = "Document not found", body = ErrorBody)
    ),
    security(("api_key" = []))
)]
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);

    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
