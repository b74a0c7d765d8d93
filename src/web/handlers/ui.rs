//! HTML page handlers.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::document::{DocumentService, UploadOutcome};
use crate::web::dto::IndexPageQuery;
use crate::web::error::ApiError;
use crate::web::handlers::document::{download_response, read_multipart_upload};
use crate::web::handlers::AppState;
use crate::web::ui::{render_index, Flash};

/// Form carrying only a CSRF token.
#[derive(Debug, Deserialize)]
pub struct CsrfForm {
    #[serde(default)]
    pub csrf_token: String,
}

async fn render_page(
    state: &AppState,
    page: u32,
    page_size: u32,
    flash: Option<Flash>,
) -> Result<Html<String>, ApiError> {
    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);
    let documents = service.list(page, page_size).await?;

    Ok(Html(render_index(
        &documents,
        &state.csrf.issue(),
        flash.as_ref(),
        &state.policy.allowed_extensions(),
        state.policy.max_size,
    )))
}

/// GET / - Document list and upload form.
pub async fn index_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IndexPageQuery>,
) -> Result<Html<String>, ApiError> {
    let flash = query.msg.as_deref().and_then(Flash::from_code);
    render_page(&state, query.page(), query.page_size(), flash).await
}

/// POST / - Upload from the HTML form.
///
/// An invalid CSRF token re-renders the first page with an error. Otherwise
/// the browser is redirected back with a flash code.
pub async fn index_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let upload = match read_multipart_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            tracing::warn!("Upload via UI failed: {}", e);
            return Ok(Redirect::to("/?msg=err").into_response());
        }
    };

    let csrf_ok = upload
        .csrf_token
        .as_deref()
        .is_some_and(|token| state.csrf.verify(token));
    if !csrf_ok {
        tracing::warn!("Rejected UI upload with invalid CSRF token");
        let flash = Flash::error("Invalid or expired CSRF token. Please try again.");
        let page = render_page(&state, 1, 10, Some(flash)).await?;
        return Ok((StatusCode::FORBIDDEN, page).into_response());
    }

    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);

    let target = match service
        .upload(upload.filename.as_deref(), &upload.content)
        .await
    {
        Ok(UploadOutcome::Accepted(_)) => "/?msg=ok",
        Ok(UploadOutcome::Rejected(rejection)) => {
            tracing::info!("Upload via UI rejected: {}", rejection);
            "/?msg=err"
        }
        Err(fault) => {
            tracing::error!("Upload via UI failed: {}", fault);
            "/?msg=err"
        }
    };

    Ok(Redirect::to(target).into_response())
}

/// POST /delete/:id - Delete from the HTML form.
pub async fn index_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<CsrfForm>,
) -> Redirect {
    if !state.csrf.verify(&form.csrf_token) {
        tracing::warn!(document_id = id, "Rejected UI delete with invalid CSRF token");
        return Redirect::to("/");
    }

    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);

    match service.delete(id).await {
        Ok(_) => Redirect::to("/?msg=deleted"),
        Err(e) => {
            tracing::error!(document_id = id, "Delete via UI failed: {}", e);
            Redirect::to("/?msg=del_err")
        }
    }
}

/// GET /download/:id - Download linked from the HTML page.
pub async fn index_download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let repo = state.repository();
    let service = DocumentService::new(&state.policy, &state.storage, &repo);

    Ok(download_response(service.download(id).await?))
}
