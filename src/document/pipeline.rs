//! Upload pipeline.
//!
//! An upload moves through these stages, in order:
//!
//! ```text
//! Received -> ExtensionChecked -> NonEmptyChecked -> SizeChecked
//!          -> ContentSniffed -> Sanitized -> Written -> Indexed
//! ```
//!
//! Every gate up to `Sanitized` can reject with a [`Rejection`] and has no
//! side effects. `Written` can fail with [`UploadFault::Storage`]. If
//! `Indexed` fails, the file written in the previous stage is deleted before
//! [`UploadFault::Index`] is returned.

use std::fmt;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::classifier::{self, default_allowed_types, AllowedType};
use super::index::DocumentIndex;
use super::record::{Document, NewDocument};
use super::sanitize::sanitize_filename;
use super::storage::DocumentStorage;
use crate::config::Config;
use crate::DocvaultError;

/// Stages of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    ExtensionChecked,
    NonEmptyChecked,
    SizeChecked,
    ContentSniffed,
    Sanitized,
    Written,
    Indexed,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Received => "received",
            UploadStage::ExtensionChecked => "extension_checked",
            UploadStage::NonEmptyChecked => "non_empty_checked",
            UploadStage::SizeChecked => "size_checked",
            UploadStage::ContentSniffed => "content_sniffed",
            UploadStage::Sanitized => "sanitized",
            UploadStage::Written => "written",
            UploadStage::Indexed => "indexed",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an upload was refused. Rejections never leave anything on disk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Filename is required")]
    FilenameRequired,

    #[error("Unsupported file type '{extension}'. Allowed: {}", .allowed.join(", "))]
    UnsupportedExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("File must not be empty")]
    EmptyFile,

    #[error("File too large: {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("File content does not match extension '{extension}' (detected {detected})")]
    ContentMismatch { extension: String, detected: String },
}

impl Rejection {
    /// The gate that produced this rejection.
    pub fn stage(&self) -> UploadStage {
        match self {
            Rejection::FilenameRequired => UploadStage::Received,
            Rejection::UnsupportedExtension { .. } => UploadStage::ExtensionChecked,
            Rejection::EmptyFile => UploadStage::NonEmptyChecked,
            Rejection::FileTooLarge { .. } => UploadStage::SizeChecked,
            Rejection::ContentMismatch { .. } => UploadStage::ContentSniffed,
        }
    }
}

/// Hard failures after validation passed.
#[derive(Debug, Error)]
pub enum UploadFault {
    /// Writing the file failed. Nothing was indexed.
    #[error("storage failure: {0}")]
    Storage(#[source] DocvaultError),

    /// Inserting the record failed. The written file was rolled back.
    #[error("index failure: {0}")]
    Index(#[source] DocvaultError),
}

/// Result of an upload that did not hit a hard failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted(Document),
    Rejected(Rejection),
}

/// Upload rules, built once at startup.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed_types: Vec<AllowedType>,
    /// Maximum content length in bytes.
    pub max_size: u64,
}

impl UploadPolicy {
    /// Policy with the standard allow-list and the given size limit.
    pub fn new(max_size: u64) -> Self {
        Self {
            allowed_types: default_allowed_types(),
            max_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.storage.max_upload_size_bytes)
    }

    /// Allowed extensions, in allow-list order.
    pub fn allowed_extensions(&self) -> Vec<String> {
        self.allowed_types
            .iter()
            .map(|t| t.extension.clone())
            .collect()
    }
}

/// Output of the validation gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUpload {
    pub filename: String,
    pub content_type: String,
}

/// Orchestrates validation, storage, and indexing for one upload.
pub struct UploadPipeline<'a, I: DocumentIndex> {
    policy: &'a UploadPolicy,
    storage: &'a DocumentStorage,
    index: &'a I,
}

impl<'a, I: DocumentIndex> UploadPipeline<'a, I> {
    pub fn new(policy: &'a UploadPolicy, storage: &'a DocumentStorage, index: &'a I) -> Self {
        Self {
            policy,
            storage,
            index,
        }
    }

    /// Run the validation gates, cheapest first.
    pub fn validate(
        &self,
        filename: Option<&str>,
        content: &[u8],
    ) -> std::result::Result<ValidatedUpload, Rejection> {
        let filename = match filename {
            Some(name) if !name.is_empty() => name,
            _ => return Err(Rejection::FilenameRequired),
        };
        debug!(stage = %UploadStage::Received, filename, "Upload received");

        let extension = classifier::extension_of(filename);
        let allowed = classifier::lookup(&self.policy.allowed_types, &extension).ok_or_else(|| {
            Rejection::UnsupportedExtension {
                extension: extension.clone(),
                allowed: self.policy.allowed_extensions(),
            }
        })?;
        debug!(stage = %UploadStage::ExtensionChecked, %extension);

        if content.is_empty() {
            return Err(Rejection::EmptyFile);
        }
        debug!(stage = %UploadStage::NonEmptyChecked);

        let size = content.len() as u64;
        if size > self.policy.max_size {
            return Err(Rejection::FileTooLarge {
                size,
                limit: self.policy.max_size,
            });
        }
        debug!(stage = %UploadStage::SizeChecked, size);

        let detected = classifier::sniff(content);
        if !allowed.accepts(&detected) {
            return Err(Rejection::ContentMismatch { extension, detected });
        }
        debug!(stage = %UploadStage::ContentSniffed, %detected);

        let sanitized = sanitize_filename(filename);
        debug!(stage = %UploadStage::Sanitized, filename = %sanitized);

        Ok(ValidatedUpload {
            filename: sanitized,
            content_type: allowed.content_type.clone(),
        })
    }

    /// Run the whole pipeline.
    pub async fn run(
        &self,
        filename: Option<&str>,
        content: &[u8],
    ) -> std::result::Result<UploadOutcome, UploadFault> {
        let validated = match self.validate(filename, content) {
            Ok(v) => v,
            Err(rejection) => {
                info!(
                    stage = %rejection.stage(),
                    reason = %rejection,
                    "Upload rejected"
                );
                return Ok(UploadOutcome::Rejected(rejection));
            }
        };

        let storage_path = self
            .storage
            .write(content, &validated.filename)
            .map_err(|e| {
                error!(error = %e, filename = %validated.filename, "Failed to store upload");
                UploadFault::Storage(e)
            })?;
        debug!(stage = %UploadStage::Written, %storage_path);

        let new_doc = NewDocument {
            filename: validated.filename,
            size: content.len() as u64,
            content_type: validated.content_type,
            upload_timestamp: Utc::now(),
            storage_path,
        };

        match self.index.insert(&new_doc).await {
            Ok(id) => {
                info!(
                    document_id = id,
                    filename = %new_doc.filename,
                    size = new_doc.size,
                    "Document uploaded"
                );
                Ok(UploadOutcome::Accepted(new_doc.into_document(id)))
            }
            Err(e) => {
                error!(
                    error = %e,
                    storage_path = %new_doc.storage_path,
                    "Index insert failed, rolling back stored file"
                );
                self.rollback(&new_doc.storage_path);
                Err(UploadFault::Index(e))
            }
        }
    }

    /// Compensating delete for a file whose index insert failed.
    ///
    /// A failure here is logged and otherwise ignored so the index error
    /// stays the reported cause.
    fn rollback(&self, storage_path: &str) {
        match self.storage.delete(storage_path) {
            Ok(_) => debug!(%storage_path, "Rolled back stored file"),
            Err(e) => warn!(%storage_path, error = %e, "Rollback failed, file left orphaned"),
        }
    }
}
