//! docvault - document storage service
//!
//! Accepts uploaded documents, validates them against a type and size
//! policy, stores the bytes on disk, and keeps a SQLite index of the
//! stored documents. The file store and the index are kept consistent:
//! an upload either ends with both a file and an index row, or neither.

pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod logging;
pub mod web;

pub use config::Config;
pub use db::Database;
pub use document::{
    Document, DocumentIndex, DocumentRepository, DocumentService, DocumentStorage, Rejection,
    UploadOutcome, UploadPolicy,
};
pub use error::{DocvaultError, Result};
pub use web::{AppState, WebServer};
