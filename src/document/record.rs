//! Document record types.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::DocvaultError;

/// A committed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Index-assigned id, never reused.
    pub id: i64,
    /// Sanitized display name.
    pub filename: String,
    /// Byte length of the stored content.
    pub size: u64,
    /// Canonical content type from the allow-list.
    pub content_type: String,
    /// Creation instant.
    pub upload_timestamp: DateTime<Utc>,
    /// Storage identifier of the backing file. Internal only.
    pub storage_path: String,
}

/// A document about to be inserted into the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub filename: String,
    pub size: u64,
    pub content_type: String,
    pub upload_timestamp: DateTime<Utc>,
    pub storage_path: String,
}

impl NewDocument {
    /// Attach the id assigned by the index.
    pub fn into_document(self, id: i64) -> Document {
        Document {
            id,
            filename: self.filename,
            size: self.size,
            content_type: self.content_type,
            upload_timestamp: self.upload_timestamp,
            storage_path: self.storage_path,
        }
    }
}

/// Serialize a timestamp the way it is stored in the index.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Raw row of the `documents` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentRow {
    pub id: i64,
    pub filename: String,
    pub size: i64,
    pub content_type: String,
    pub upload_timestamp: String,
    pub storage_path: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = DocvaultError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let size = u64::try_from(row.size).map_err(|_| {
            DocvaultError::Database(format!("document {} has negative size {}", row.id, row.size))
        })?;
        let upload_timestamp = DateTime::parse_from_rfc3339(&row.upload_timestamp)
            .map_err(|e| {
                DocvaultError::Database(format!(
                    "document {} has malformed timestamp {:?}: {e}",
                    row.id, row.upload_timestamp
                ))
            })?
            .with_timezone(&Utc);

        Ok(Document {
            id: row.id,
            filename: row.filename,
            size,
            content_type: row.content_type,
            upload_timestamp,
            storage_path: row.storage_path,
        })
    }
}
