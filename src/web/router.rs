//! Router configuration for the HTTP layer.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    delete_document, download_document, get_document, index_delete, index_download, index_page,
    index_upload, list_documents, upload_document, AppState,
};
use super::middleware::{
    create_cors_layer, rate_limit, require_api_key, security_headers, ApiKeyState, RateLimitState,
};
use super::openapi::ApiDoc;
use crate::config::WebConfig;
use crate::Result;

/// Room for multipart framing on top of the upload limit.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Body limit for a given upload limit.
pub fn body_limit_for(max_upload_size: u64) -> usize {
    usize::try_from(max_upload_size.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX)
}

/// Create the application router with all middleware.
pub fn create_router(
    app_state: Arc<AppState>,
    rate_limit_state: Arc<RateLimitState>,
    config: &WebConfig,
) -> Result<Router> {
    let api_key_state = Arc::new(ApiKeyState::new(&config.api_key)?);
    if !api_key_state.is_enabled() {
        tracing::warn!("No API key configured, /documents routes are unauthenticated");
    } else if config.serve_ui {
        tracing::warn!(
            "HTML page is served without the API key, set web.serve_ui = false to disable it"
        );
    }

    let body_limit = body_limit_for(app_state.policy.max_size);

    let document_routes = Router::new()
        .route("/documents", get(list_documents).post(upload_document))
        .route("/documents/:id", get(get_document).delete(delete_document))
        .route("/documents/:id/download", get(download_document))
        .route_layer(middleware::from_fn(move |req, next| {
            let state = api_key_state.clone();
            require_api_key(state, req, next)
        }));

    let mut routes = Router::new().merge(document_routes);
    if config.serve_ui {
        routes = routes
            .route("/", get(index_page).post(index_upload))
            .route("/delete/:id", post(index_delete))
            .route("/download/:id", get(index_download));
    }

    let mut router = routes.with_state(app_state).merge(create_health_router());

    if config.serve_docs {
        router = router.merge(create_swagger_router());
    }

    Ok(router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&config.cors_origins))
            .layer(middleware::from_fn(security_headers))
            .layer(middleware::from_fn(move |req, next| {
                let state = rate_limit_state.clone();
                rate_limit(state, req, next)
            }))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(CompressionLayer::new()),
    ))
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Create the Swagger UI router serving the OpenAPI document.
pub fn create_swagger_router() -> Router {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_limit_for() {
        assert_eq!(body_limit_for(1024), 1024 + 64 * 1024);
        assert_eq!(body_limit_for(u64::MAX), usize::MAX);
    }
}
