//! Storage writer for docvault.
//!
//! Documents are stored under a random identifier in a sharded layout:
//! ```text
//! {root}/
//! ├── 3f/
//! │   └── 3f2a9c1e-5b7d-4e0a-9f1c-0d8e7b6a5c4d_report.pdf
//! ├── a0/
//! │   └── a07b...-..._notes.txt
//! └── ...
//! ```
//! The shard is the first two characters of the identifier.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use uuid::Uuid;

use super::sanitize::{truncate_preserving_extension, MAX_FILENAME_LENGTH};
use crate::{DocvaultError, Result};

/// Suffix of in-progress writes.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Maximum identifier length, leaving room for the partial suffix in one path component.
pub const MAX_STORAGE_ID_LENGTH: usize = MAX_FILENAME_LENGTH - PARTIAL_SUFFIX.len();

/// A file found while walking the storage tree.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Storage identifier (for partial files, including the suffix).
    pub name: String,
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: SystemTime,
    /// Whether this is a leftover in-progress write.
    pub partial: bool,
}

/// Durable document store.
#[derive(Debug, Clone)]
pub struct DocumentStorage {
    root: PathBuf,
}

impl DocumentStorage {
    /// Create a storage rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate a fresh collision-free identifier for a sanitized filename.
    pub fn generate_storage_id(sanitized_name: &str) -> String {
        let id = format!("{}_{}", Uuid::new_v4(), sanitized_name);
        truncate_preserving_extension(&id, MAX_STORAGE_ID_LENGTH)
    }

    /// Write `content` under a new identifier and return the identifier.
    ///
    /// The bytes go to a `.partial` sibling, are synced, then renamed into
    /// place. On failure the partial file is removed, so either the whole
    /// buffer is stored or nothing is.
    pub fn write(&self, content: &[u8], sanitized_name: &str) -> Result<String> {
        let storage_id = Self::generate_storage_id(sanitized_name);
        let final_path = self.path_for(&storage_id)?;

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let partial_path = partial_path_for(&final_path);
        if let Err(e) = write_synced(&partial_path, content)
            .and_then(|()| fs::rename(&partial_path, &final_path))
        {
            if let Err(cleanup) = remove_if_exists(&partial_path) {
                tracing::warn!(
                    path = %partial_path.display(),
                    error = %cleanup,
                    "Failed to remove partial write"
                );
            }
            return Err(e.into());
        }

        tracing::debug!(storage_path = %storage_id, bytes = content.len(), "Stored document file");
        Ok(storage_id)
    }

    /// Delete a stored file.
    ///
    /// Returns `true` if a file was removed and `false` if it was already
    /// absent. Absence is not an error, so this can be called repeatedly.
    pub fn delete(&self, storage_id: &str) -> Result<bool> {
        let path = self.path_for(storage_id)?;
        Ok(remove_if_exists(&path)?)
    }

    /// Resolve an identifier to the absolute path of an existing file.
    pub fn resolve(&self, storage_id: &str) -> Result<PathBuf> {
        let path = self.path_for(storage_id)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(DocvaultError::NotFound(format!("file {storage_id}")))
        }
    }

    /// Load the full content of a stored file.
    pub fn load(&self, storage_id: &str) -> Result<Vec<u8>> {
        let path = self.path_for(storage_id)?;
        fs::read(&path).map_err(|e| not_found_or_io(e, storage_id))
    }

    /// List every file in the shard directories.
    pub fn entries(&self) -> Result<Vec<StoredEntry>> {
        let mut entries = Vec::new();

        for shard in fs::read_dir(&self.root)? {
            let shard = shard?;
            if !shard.file_type()?.is_dir() {
                continue;
            }
            for entry in fs::read_dir(shard.path())? {
                let entry = entry?;
                let metadata = entry.metadata()?;
                if !metadata.is_file() {
                    continue;
                }
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                entries.push(StoredEntry {
                    partial: name.ends_with(PARTIAL_SUFFIX),
                    name,
                    path: entry.path(),
                    modified: metadata.modified()?,
                });
            }
        }

        Ok(entries)
    }

    /// Remove empty shard directories. Returns how many were removed.
    pub fn cleanup_empty_dirs(&self) -> Result<usize> {
        let mut removed = 0;

        for entry in fs::read_dir(&self.root)?.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if let Ok(mut contents) = fs::read_dir(&path) {
                    if contents.next().is_none() && fs::remove_dir(&path).is_ok() {
                        removed += 1;
                    }
                }
            }
        }

        Ok(removed)
    }

    /// Build `{root}/{shard}/{storage_id}` after rejecting unsafe identifiers.
    fn path_for(&self, storage_id: &str) -> Result<PathBuf> {
        validate_storage_id(storage_id)?;
        Ok(self.root.join(get_shard(storage_id)).join(storage_id))
    }
}

/// Reject identifiers that could escape the storage root.
fn validate_storage_id(storage_id: &str) -> Result<()> {
    if storage_id.is_empty()
        || storage_id.contains(['/', '\\', '\0'])
        || storage_id.contains("..")
    {
        return Err(DocvaultError::Validation(format!(
            "invalid storage identifier: {storage_id:?}"
        )));
    }
    Ok(())
}

/// First two characters of the identifier.
fn get_shard(storage_id: &str) -> &str {
    match storage_id.char_indices().nth(2) {
        Some((end, _)) => &storage_id[..end],
        None => storage_id,
    }
}

fn partial_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

fn not_found_or_io(e: io::Error, storage_id: &str) -> DocvaultError {
    if e.kind() == io::ErrorKind::NotFound {
        DocvaultError::NotFound(format!("file {storage_id}"))
    } else {
        e.into()
    }
}
