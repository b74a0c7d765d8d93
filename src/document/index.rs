//! Document index.
//!
//! [`DocumentIndex`] is the seam between the upload pipeline and durable
//! metadata storage. [`DocumentRepository`] implements it on SQLite.

use std::collections::HashSet;
use std::future::Future;

use sqlx::SqlitePool;

use super::record::{format_timestamp, Document, DocumentRow, NewDocument};
use crate::{DocvaultError, Result};

/// One page of a newest-first listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    pub documents: Vec<Document>,
    pub page: u32,
    pub page_size: u32,
    /// Number of documents in the whole index.
    pub total: u64,
}

/// Ordered collection of document records.
///
/// Every method is a single atomic unit against durable storage.
pub trait DocumentIndex: Send + Sync {
    /// Insert a record and return its newly assigned id.
    fn insert(&self, doc: &NewDocument) -> impl Future<Output = Result<i64>> + Send;

    /// List one page, newest first, together with the total count.
    ///
    /// `page` is 1-based.
    fn list(&self, page: u32, page_size: u32)
        -> impl Future<Output = Result<DocumentPage>> + Send;

    /// Get a record by id.
    fn get(&self, id: i64) -> impl Future<Output = Result<Option<Document>>> + Send;

    /// Remove a record by id, returning it if it existed.
    fn delete(&self, id: i64) -> impl Future<Output = Result<Option<Document>>> + Send;

    /// Every storage identifier referenced by the index.
    fn storage_paths(&self) -> impl Future<Output = Result<HashSet<String>>> + Send;
}

const SELECT_COLUMNS: &str =
    "SELECT id, filename, size, content_type, upload_timestamp, storage_path FROM documents";

/// SQLite-backed document index.
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    /// Create a new DocumentRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }
}

impl DocumentIndex for DocumentRepository<'_> {
    async fn insert(&self, doc: &NewDocument) -> Result<i64> {
        let size = i64::try_from(doc.size)
            .map_err(|_| DocvaultError::Validation(format!("size {} out of range", doc.size)))?;

        let result = sqlx::query(
            "INSERT INTO documents (filename, size, content_type, upload_timestamp, storage_path)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&doc.filename)
        .bind(size)
        .bind(&doc.content_type)
        .bind(format_timestamp(&doc.upload_timestamp))
        .bind(&doc.storage_path)
        .execute(self.pool)
        .await
        .map_err(|e| DocvaultError::Database(e.to_string()))?;

        Ok(result.last_insert_rowid())
    }

    async fn list(&self, page: u32, page_size: u32) -> Result<DocumentPage> {
        if page == 0 || page_size == 0 {
            return Err(DocvaultError::Validation(
                "page and page_size must be at least 1".to_string(),
            ));
        }
        let offset = (i64::from(page) - 1) * i64::from(page_size);

        let mut tx = self.pool.begin().await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DocvaultError::Database(e.to_string()))?;

        let rows: Vec<DocumentRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} ORDER BY id DESC LIMIT ? OFFSET ?"))
                .bind(i64::from(page_size))
                .bind(offset)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| DocvaultError::Database(e.to_string()))?;

        tx.commit().await?;

        let documents = rows
            .into_iter()
            .map(Document::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(DocumentPage {
            documents,
            page,
            page_size,
            total: total.max(0) as u64,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| DocvaultError::Database(e.to_string()))?;

        row.map(Document::try_from).transpose()
    }

    async fn delete(&self, id: i64) -> Result<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(
            "DELETE FROM documents WHERE id = ?
             RETURNING id, filename, size, content_type, upload_timestamp, storage_path",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| DocvaultError::Database(e.to_string()))?;

        row.map(Document::try_from).transpose()
    }

    async fn storage_paths(&self) -> Result<HashSet<String>> {
        let paths: Vec<String> = sqlx::query_scalar("SELECT storage_path FROM documents")
            .fetch_all(self.pool)
            .await
            .map_err(|e| DocvaultError::Database(e.to_string()))?;

        Ok(paths.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use chrono::Utc;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn new_doc(name: &str) -> NewDocument {
        NewDocument {
            filename: name.to_string(),
            size: 5,
            content_type: "text/plain".to_string(),
            upload_timestamp: Utc::now(),
            storage_path: format!("{}_{name}", uuid::Uuid::new_v4()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup_db().await;
        let repo = DocumentRepository::new(db.pool());

        let new = new_doc("a.txt");
        let id = repo.insert(&new).await.unwrap();

        let doc = repo.get(id).await.unwrap().unwrap();
        assert_eq!(doc.filename, "a.txt");
        assert_eq!(doc.size, 5);
        assert_eq!(doc.storage_path, new.storage_path);
        assert_eq!(
            format_timestamp(&doc.upload_timestamp),
            format_timestamp(&new.upload_timestamp)
        );
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let db = setup_db().await;
        let repo = DocumentRepository::new(db.pool());
        assert!(repo.get(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_total() {
        let db = setup_db().await;
        let repo = DocumentRepository::new(db.pool());

        for i in 0..5 {
            repo.insert(&new_doc(&format!("{i}.txt"))).await.unwrap();
        }

        let page = repo.list(1, 2).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.documents.len(), 2);
        assert_eq!(page.documents[0].filename, "4.txt");
        assert_eq!(page.documents[1].filename, "3.txt");

        let page = repo.list(2, 2).await.unwrap();
        assert_eq!(page.documents.len(), 2);
        assert_eq!(page.documents[0].filename, "2.txt");

        let page = repo.list(3, 2).await.unwrap();
        assert_eq!(page.documents.len(), 1);

        let page = repo.list(99, 2).await.unwrap();
        assert!(page.documents.is_empty());
        assert_eq!(page.total, 5);
    }

    #[tokio::test]
    async fn test_list_rejects_zero_page() {
        let db = setup_db().await;
        let repo = DocumentRepository::new(db.pool());
        assert!(matches!(repo.list(0, 10).await, Err(DocvaultError::Validation(_))));
        assert!(matches!(repo.list(1, 0).await, Err(DocvaultError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_returns_record() {
        let db = setup_db().await;
        let repo = DocumentRepository::new(db.pool());

        let id = repo.insert(&new_doc("d.txt")).await.unwrap();

        let removed = repo.delete(id).await.unwrap().unwrap();
        assert_eq!(removed.id, id);
        assert!(repo.get(id).await.unwrap().is_none());
        assert!(repo.delete(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_never_reused() {
        let db = setup_db().await;
        let repo = DocumentRepository::new(db.pool());

        let first = repo.insert(&new_doc("a.txt")).await.unwrap();
        repo.delete(first).await.unwrap();
        let second = repo.insert(&new_doc("b.txt")).await.unwrap();

        assert!(second > first);
    }

    #[tokio::test]
    async fn test_duplicate_storage_path_rejected() {
        let db = setup_db().await;
        let repo = DocumentRepository::new(db.pool());

        let doc = new_doc("a.txt");
        repo.insert(&doc).await.unwrap();
        let result = repo.insert(&doc).await;

        assert!(matches!(result, Err(DocvaultError::Database(_))));
    }

    #[tokio::test]
    async fn test_storage_paths() {
        let db = setup_db().await;
        let repo = DocumentRepository::new(db.pool());

        let a = new_doc("a.txt");
        let b = new_doc("b.txt");
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let paths = repo.storage_paths().await.unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&a.storage_path));
        assert!(paths.contains(&b.storage_path));
    }
}
