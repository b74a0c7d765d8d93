//! Document service.
//!
//! Bundles policy, storage, and index behind the operations the web layer
//! consumes.

use tracing::{error, info, warn};

use super::index::{DocumentIndex, DocumentPage};
use super::pipeline::{UploadFault, UploadOutcome, UploadPipeline, UploadPolicy};
use super::record::Document;
use super::storage::DocumentStorage;
use crate::{DocvaultError, Result};

/// A document together with its stored bytes.
#[derive(Debug, Clone)]
pub struct Download {
    pub document: Document,
    pub content: Vec<u8>,
}

/// Document operations over a storage and an index.
pub struct DocumentService<'a, I: DocumentIndex> {
    policy: &'a UploadPolicy,
    storage: &'a DocumentStorage,
    index: &'a I,
}

impl<'a, I: DocumentIndex> DocumentService<'a, I> {
    pub fn new(policy: &'a UploadPolicy, storage: &'a DocumentStorage, index: &'a I) -> Self {
        Self {
            policy,
            storage,
            index,
        }
    }

    /// Validate, store, and index an upload.
    pub async fn upload(
        &self,
        filename: Option<&str>,
        content: &[u8],
    ) -> std::result::Result<UploadOutcome, UploadFault> {
        UploadPipeline::new(self.policy, self.storage, self.index)
            .run(filename, content)
            .await
    }

    /// List documents, newest first.
    pub async fn list(&self, page: u32, page_size: u32) -> Result<DocumentPage> {
        self.index.list(page, page_size).await
    }

    /// Get a document by id.
    pub async fn get(&self, id: i64) -> Result<Document> {
        self.index
            .get(id)
            .await?
            .ok_or_else(|| DocvaultError::NotFound(format!("document {id}")))
    }

    /// Load a document and its content.
    ///
    /// A missing file is `NotFound`. A file whose length differs from the
    /// recorded size is a `Consistency` fault.
    pub async fn download(&self, id: i64) -> Result<Download> {
        let document = self.get(id).await?;

        let content = self.storage.load(&document.storage_path).map_err(|e| {
            if matches!(e, DocvaultError::NotFound(_)) {
                warn!(
                    document_id = id,
                    storage_path = %document.storage_path,
                    "Indexed document has no file on disk"
                );
            }
            e
        })?;

        if content.len() as u64 != document.size {
            error!(
                document_id = id,
                storage_path = %document.storage_path,
                expected = document.size,
                actual = content.len(),
                "Stored file size does not match index"
            );
            return Err(DocvaultError::Consistency(format!(
                "document {id}: expected {} bytes, found {}",
                document.size,
                content.len()
            )));
        }

        Ok(Download { document, content })
    }

    /// Delete a document.
    ///
    /// The index row is removed first and decides visibility. The file is
    /// then deleted best-effort.
    pub async fn delete(&self, id: i64) -> Result<Document> {
        let document = self
            .index
            .delete(id)
            .await?
            .ok_or_else(|| DocvaultError::NotFound(format!("document {id}")))?;

        match self.storage.delete(&document.storage_path) {
            Ok(true) => {}
            Ok(false) => warn!(
                document_id = id,
                storage_path = %document.storage_path,
                "Deleted document had no file on disk"
            ),
            Err(e) => warn!(
                document_id = id,
                storage_path = %document.storage_path,
                error = %e,
                "Failed to delete document file"
            ),
        }

        info!(document_id = id, filename = %document.filename, "Document deleted");
        Ok(document)
    }
}
