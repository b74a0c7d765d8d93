//! Document storage core.
//!
//! Uploads pass through the [`pipeline`], which validates them with the
//! [`classifier`] and [`sanitize`] modules, writes them through [`storage`],
//! and records them in an [`index`].

pub mod classifier;
pub mod index;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod sanitize;
pub mod service;
pub mod storage;

pub use classifier::{AllowedType, DOCX_MIME};
pub use index::{DocumentIndex, DocumentPage, DocumentRepository};
pub use pipeline::{
    Rejection, UploadFault, UploadOutcome, UploadPipeline, UploadPolicy, UploadStage,
    ValidatedUpload,
};
pub use reconcile::{reconcile, ReconcileOptions, ReconcileReport};
pub use record::{Document, DocumentRow, NewDocument};
pub use sanitize::sanitize_filename;
pub use service::{DocumentService, Download};
pub use storage::DocumentStorage;
