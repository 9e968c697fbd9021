//! Byte storage for serialized model artifacts.

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::debug;

use crate::WarehouseError;

/// Keyed blob store for model artifacts.
pub trait ArtifactStore: Send + Sync {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), WarehouseError>;

    /// # Errors
    /// Returns [`WarehouseError::NotFound`] when no artifact exists for `key`.
    fn read(&self, key: &str) -> Result<Vec<u8>, WarehouseError>;

    /// Returns whether an artifact was removed.
    fn delete(&self, key: &str) -> Result<bool, WarehouseError>;

    fn exists(&self, key: &str) -> Result<bool, WarehouseError>;
}

/// Artifacts stored as files in one directory.
///
/// Writes land in a temporary sibling file first and are renamed into place,
/// so readers never observe a half-written artifact.
#[derive(Debug)]
pub struct FsArtifactStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FsArtifactStore {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, WarehouseError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, WarehouseError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), WarehouseError> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(
            ".{key}.{}-{}.tmp",
            std::process::id(),
            self.tmp_counter.fetch_add(1, Ordering::Relaxed)
        ));

        let written = (|| -> Result<(), std::io::Error> {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        })();
        if let Err(error) = written {
            let _ = fs::remove_file(&tmp);
            return Err(error.into());
        }

        debug!(key, bytes = bytes.len(), "artifact written");
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, WarehouseError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                Err(WarehouseError::NotFound(key.to_owned()))
            }
            Err(error) => Err(error.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<bool, WarehouseError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key, "artifact deleted");
                Ok(true)
            }
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error.into()),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, WarehouseError> {
        Ok(self.path_for(key)?.is_file())
    }
}

/// Artifacts held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs
            .lock()
            .expect("in-memory artifact store mutex poisoned")
    }
}

impl ArtifactStore for InMemoryArtifactStore {
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), WarehouseError> {
        validate_key(key)?;
        self.blobs().insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Vec<u8>, WarehouseError> {
        self.blobs()
            .get(key)
            .cloned()
            .ok_or_else(|| WarehouseError::NotFound(key.to_owned()))
    }

    fn delete(&self, key: &str) -> Result<bool, WarehouseError> {
        Ok(self.blobs().remove(key).is_some())
    }

    fn exists(&self, key: &str) -> Result<bool, WarehouseError> {
        Ok(self.blobs().contains_key(key))
    }
}

/// Keys are flat file names: no separators, no leading dot.
fn validate_key(key: &str) -> Result<(), WarehouseError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(WarehouseError::InvalidKey(key.to_owned()))
    }
}
