//! HTTP handlers.

pub mod document;
pub mod ui;

pub use document::*;
pub use ui::*;

use crate::config::Config;
use crate::document::{DocumentRepository, DocumentStorage, UploadPolicy};
use crate::web::csrf::CsrfProtector;
use crate::{Database, Result};

/// Shared application state.
pub struct AppState {
    /// Index database.
    pub db: Database,
    /// File store.
    pub storage: DocumentStorage,
    /// Upload rules.
    pub policy: UploadPolicy,
    /// CSRF token issuer for the HTML forms.
    pub csrf: CsrfProtector,
}

impl AppState {
    pub fn new(
        db: Database,
        storage: DocumentStorage,
        policy: UploadPolicy,
        csrf: CsrfProtector,
    ) -> Self {
        Self {
            db,
            storage,
            policy,
            csrf,
        }
    }

    /// Build the state from configuration and an opened database.
    pub fn from_config(config: &Config, db: Database) -> Result<Self> {
        let storage = DocumentStorage::new(&config.storage.path)?;
        tracing::info!("Document storage initialized at: {}", config.storage.path);

        Ok(Self::new(
            db,
            storage,
            UploadPolicy::from_config(config),
            CsrfProtector::new(&config.web.csrf_secret)?,
        ))
    }

    /// Index repository over the shared pool.
    pub fn repository(&self) -> DocumentRepository<'_> {
        DocumentRepository::new(self.db.pool())
    }
}
