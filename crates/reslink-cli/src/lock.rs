//! Single-writer guard for a snapshot file
//!
//! Each mutating command loads the whole snapshot, edits it in memory and writes
//! it back. Two such commands on one snapshot would each write their own copy
//! and the later rename would drop the other's edit. A `<snapshot>.lock` file
//! created exclusively keeps writers to one at a time; reads take no lock.

use anyhow::Context;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Exclusive write access to one snapshot, released on drop
#[derive(Debug)]
pub(crate) struct WriterLock {
    path: PathBuf,
    _file: File,
}

impl WriterLock {
    /// Lock file guarding `snapshot`
    pub(crate) fn path_for(snapshot: &Path) -> PathBuf {
        let mut name = OsString::from(snapshot.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Take the writer lock, failing at once if another writer holds it
    pub(crate) fn acquire(snapshot: &Path) -> anyhow::Result<Self> {
        let path = Self::path_for(snapshot);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => anyhow::bail!(
                "{} is being written by another reslink process; remove {} if none is running",
                snapshot.display(),
                path.display()
            ),
            Err(e) => {
                return Err(e).with_context(|| format!("cannot create lock {}", path.display()))
            }
        };
        // Owner pid, for whoever has to clear a stale lock.
        writeln!(file, "{}", std::process::id())
            .with_context(|| format!("cannot write lock {}", path.display()))?;
        tracing::debug!("Writer lock {} taken", path.display());
        Ok(Self { path, _file: file })
    }
}

impl Drop for WriterLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!("Cannot remove writer lock {}: {}", self.path.display(), e);
        }
    }
}
