//! Blob backends for the history document.
//!
//! The store persists one logical document. A [`Blob`] holds its raw
//! bytes; versioning and merge semantics live in the store itself.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Error, Result};

/// A single logical blob of bytes.
pub trait Blob: Send {
    /// Read the full blob, or `None` if it has never been written.
    fn get(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the blob contents. The write must be all-or-nothing: a
    /// failure leaves the previous contents intact.
    fn put(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Filesystem-backed blob: one JSON file.
///
/// Writes go to a temporary file in the same directory and are renamed
/// into place, so readers never observe a partially written document.
#[derive(Debug)]
pub struct FsBlob {
    path: PathBuf,
}

impl FsBlob {
    /// Create a blob at the given path, creating parent directories if
    /// needed. The file itself is not created until the first `put`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// The file path this blob writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Blob for FsBlob {
    fn get(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

/// In-memory blob for tests.
///
/// Clones share the same underlying contents, so two stores built from
/// clones of one `MemBlob` see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemBlob {
    data: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemBlob {
    /// Create an empty in-memory blob.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Blob for MemBlob {
    fn get(&self) -> Result<Option<Vec<u8>>> {
        let data = self
            .data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(data.clone())
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let mut data = self
            .data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *data = Some(bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mem_blob_roundtrip() {
        let mut blob = MemBlob::new();
        assert!(blob.get().unwrap().is_none());

        blob.put(b"hello").unwrap();
        assert_eq!(blob.get().unwrap().unwrap(), b"hello");
    }

    #[test]
    fn test_mem_blob_clones_share_contents() {
        let mut blob = MemBlob::new();
        let other = blob.clone();

        blob.put(b"shared").unwrap();
        assert_eq!(other.get().unwrap().unwrap(), b"shared");
    }

    #[test]
    fn test_fs_blob_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut blob = FsBlob::create(&path).unwrap();
        assert!(blob.get().unwrap().is_none());

        blob.put(b"{}").unwrap();
        assert_eq!(blob.get().unwrap().unwrap(), b"{}");
        assert!(path.exists());
    }

    #[test]
    fn test_fs_blob_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("history.json");

        let mut blob = FsBlob::create(&path).unwrap();
        blob.put(b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_fs_blob_put_replaces_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut blob = FsBlob::create(&path).unwrap();
        blob.put(b"first version, quite long").unwrap();
        blob.put(b"second").unwrap();

        assert_eq!(blob.get().unwrap().unwrap(), b"second");
    }
}
