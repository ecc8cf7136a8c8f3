//! JSON snapshot persistence
//!
//! A snapshot is the whole link table as `{"version": 1, "links": [...]}`.
//! Each write goes to its own uniquely named temp file in the target's
//! directory, which is then renamed over the target. A crash mid-write leaves
//! the previous snapshot intact, and concurrent writers never share a file.

use reslink_types::{Link, StorageError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Snapshot format version understood by this crate
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a link store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    version: u32,
    links: Vec<Link>,
}

impl Snapshot {
    /// Snapshot of the given links at the current version
    #[must_use]
    pub fn new(links: Vec<Link>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            links,
        }
    }

    /// Format version
    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of links
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True if no links
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Consume into links
    #[inline]
    #[must_use]
    pub fn into_links(self) -> Vec<Link> {
        self.links
    }

    /// Parse and version-check a snapshot
    ///
    /// # Errors
    /// [`StorageError::Serialization`] on malformed JSON,
    /// [`StorageError::Corrupted`] on an unsupported version.
    pub fn from_json(bytes: &[u8]) -> Result<Self, StorageError> {
        let snapshot: Self = serde_json::from_slice(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StorageError::Corrupted(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    /// Read a snapshot file
    ///
    /// # Errors
    /// [`StorageError::Io`] if the file cannot be read, otherwise as [`Snapshot::from_json`].
    pub fn read(path: &Path) -> Result<Self, StorageError> {
        let bytes = fs::read(path).map_err(|e| StorageError::io(path, e))?;
        Self::from_json(&bytes)
    }

    /// Write the snapshot, replacing `path` atomically
    ///
    /// # Errors
    /// [`StorageError`] if encoding, writing or renaming fails.
    pub fn write(&self, path: &Path) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(self)?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StorageError::io(dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StorageError::io(tmp.path(), e))?;
        tmp.persist(path).map_err(|e| StorageError::io(path, e.error))?;
        Ok(())
    }
}
