//! Response DTOs for the HTTP API.

use serde::Serialize;
use utoipa::ToSchema;

use crate::document::record::format_timestamp;
use crate::document::{Document, DocumentPage};

/// Public metadata of a document.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: i64,
    /// Sanitized filename.
    #[schema(example = "report.pdf")]
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    #[schema(example = "application/pdf")]
    pub content_type: String,
    /// Upload time (RFC 3339, UTC).
    #[schema(example = "2024-05-01T12:30:00.000000Z")]
    pub upload_timestamp: String,
}

impl From<&Document> for DocumentResponse {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            size: doc.size,
            content_type: doc.content_type.clone(),
            upload_timestamp: format_timestamp(&doc.upload_timestamp),
        }
    }
}

impl From<Document> for DocumentResponse {
    fn from(doc: Document) -> Self {
        Self::from(&doc)
    }
}

/// One page of documents, newest first.
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub page: u32,
    pub page_size: u32,
    /// Total number of documents.
    pub total: u64,
}

impl From<DocumentPage> for DocumentListResponse {
    fn from(page: DocumentPage) -> Self {
        Self {
            documents: page.documents.iter().map(DocumentResponse::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
