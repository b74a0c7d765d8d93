//! Orphan reconciliation sweep.
//!
//! A file written by an upload whose request was aborted before the index
//! insert committed has no index row. The sweep compares the storage tree
//! against the index and removes such files once they are older than a grace
//! period. Index rows whose file is missing are reported, never deleted.

use std::time::{Duration, SystemTime};

use tracing::{debug, error, info, warn};

use super::index::DocumentIndex;
use super::storage::{DocumentStorage, StoredEntry};
use crate::config::ReconcileConfig;
use crate::Result;

/// Sweep settings.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Orphans younger than this are left alone.
    pub grace_period: Duration,
    /// Report without deleting.
    pub dry_run: bool,
}

impl From<&ReconcileConfig> for ReconcileOptions {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            grace_period: Duration::from_secs(config.grace_period_secs),
            dry_run: config.dry_run,
        }
    }
}

/// Counters from one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Files examined.
    pub scanned: usize,
    pub orphans_removed: usize,
    /// Orphans left in place (inside the grace period, or dry run).
    pub orphans_skipped: usize,
    /// Index rows with no file on disk.
    pub missing_files: usize,
    pub errors: usize,
}

enum OrphanResult {
    Kept,
    Deleted,
    Skipped,
    Error,
}

/// Run one reconciliation sweep.
///
/// The storage tree is listed before the index is read, so a file that
/// becomes indexed during the sweep is never mistaken for an orphan.
pub async fn reconcile<I: DocumentIndex>(
    storage: &DocumentStorage,
    index: &I,
    options: ReconcileOptions,
) -> Result<ReconcileReport> {
    let entries = storage.entries()?;
    let indexed = index.storage_paths().await?;
    let now = SystemTime::now();

    let mut report = ReconcileReport::default();

    for entry in &entries {
        report.scanned += 1;
        if !entry.partial && indexed.contains(&entry.name) {
            continue;
        }
        match process_orphan(storage, entry, now, options) {
            OrphanResult::Kept => {}
            OrphanResult::Deleted => report.orphans_removed += 1,
            OrphanResult::Skipped => report.orphans_skipped += 1,
            OrphanResult::Error => report.errors += 1,
        }
    }

    for storage_path in &indexed {
        if storage.resolve(storage_path).is_err() {
            report.missing_files += 1;
            error!(%storage_path, "Indexed document has no file on disk");
        }
    }

    if !options.dry_run {
        if let Err(e) = storage.cleanup_empty_dirs() {
            warn!(error = %e, "Failed to remove empty shard directories");
        }
    }

    info!(
        scanned = report.scanned,
        orphans_removed = report.orphans_removed,
        orphans_skipped = report.orphans_skipped,
        missing_files = report.missing_files,
        errors = report.errors,
        dry_run = options.dry_run,
        "Reconciliation sweep finished"
    );

    Ok(report)
}

fn process_orphan(
    storage: &DocumentStorage,
    entry: &StoredEntry,
    now: SystemTime,
    options: ReconcileOptions,
) -> OrphanResult {
    // A modification time in the future counts as brand new.
    let age = now.duration_since(entry.modified).unwrap_or_default();
    if age < options.grace_period {
        debug!(
            storage_path = %entry.name,
            age_secs = age.as_secs(),
            "Orphan within grace period, keeping"
        );
        return OrphanResult::Skipped;
    }

    if options.dry_run {
        info!(storage_path = %entry.name, partial = entry.partial, "Would remove orphaned file");
        return OrphanResult::Skipped;
    }

    match storage.delete(&entry.name) {
        Ok(true) => {
            info!(storage_path = %entry.name, partial = entry.partial, "Removed orphaned file");
            OrphanResult::Deleted
        }
        Ok(false) => OrphanResult::Kept,
        Err(e) => {
            warn!(storage_path = %entry.name, error = %e, "Failed to remove orphaned file");
            OrphanResult::Error
        }
    }
}
