//! OpenAPI document for the `/documents` API.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{DocumentListResponse, DocumentResponse};
use super::error::{ErrorBody, ErrorCode, ErrorDetail};
use super::handlers::document;
use super::middleware::API_KEY_HEADER;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "docvault",
        description = "Validated document uploads with a consistent file store and index"
    ),
    paths(
        document::upload_document,
        document::list_documents,
        document::get_document,
        document::download_document,
        document::delete_document
    ),
    components(schemas(
        DocumentResponse,
        DocumentListResponse,
        document::UploadForm,
        ErrorBody,
        ErrorDetail,
        ErrorCode
    )),
    modifiers(&ApiKeyAddon),
    tags((name = "documents", description = "Document storage"))
)]
pub struct ApiDoc;

struct ApiKeyAddon;

impl Modify for ApiKeyAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}
