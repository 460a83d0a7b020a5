//! Blob persistence for uketsuke.
//!
//! Each logical collection is durably stored as a single JSON blob under a
//! named key, read once at store construction and rewritten in full on every
//! mutation. The trait keeps the stores independent of where blobs live; the
//! file-backed implementation is the production path and the in-memory one
//! backs tests and ephemeral runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{Error, Result};

/// A named JSON blob store.
///
/// Implementations store opaque payloads and never interpret them.
pub trait BlobStore: Send + Sync + std::fmt::Debug {
    /// Read the blob stored under `key`.
    ///
    /// Returns `None` if the key has never been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails for any reason other
    /// than the key being absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write `payload` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn write(&self, key: &str, payload: &str) -> Result<()>;
}

/// File-backed blob store keeping one `<key>.json` file per key.
#[derive(Debug)]
pub struct FileBlobStore {
    /// Directory the blob files live in.
    dir: PathBuf,
}

impl FileBlobStore {
    /// Open a blob store rooted at the given directory.
    ///
    /// Creates the directory (and its parents) if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|source| Error::DirectoryCreate {
                path: dir.clone(),
                source,
            })?;
        }

        debug!("Opened blob store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Get the directory the blobs live in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.blob_path(key);
        match std::fs::read_to_string(&path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::BlobRead {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, payload: &str) -> Result<()> {
        let path = self.blob_path(key);
        std::fs::write(&path, payload).map_err(|source| Error::BlobWrite {
            key: key.to_string(),
            source,
        })?;
        debug!("Wrote blob '{}' ({} bytes)", key, payload.len());
        Ok(())
    }
}

/// In-memory blob store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| Error::internal("blob store mutex poisoned"))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| Error::internal("blob store mutex poisoned"))?;
        blobs.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}
