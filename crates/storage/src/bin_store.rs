//! Load/save of a single opaque byte payload.

use crate::errors::StorageError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// One named byte payload with existence, load and save.
///
/// Consumers treat the payload as opaque; in practice it is JSON for
/// configs and small state files.
pub trait BinStore: Send + Sync {
    fn exists(&self) -> bool;
    fn load(&self) -> Result<Vec<u8>, StorageError>;
    fn save(&self, data: &[u8]) -> Result<(), StorageError>;
}

/// File-backed store. Parent directories are created on first save.
#[derive(Debug, Clone)]
pub struct BinFileStore {
    path: PathBuf,
}

impl BinFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BinStore for BinFileStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(&self.path)?)
    }

    fn save(&self, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(fs::write(&self.path, data)?)
    }
}

/// In-memory store for tests and wiring without a data directory.
#[derive(Debug, Default)]
pub struct MemoryBinStore {
    data: Mutex<Option<Vec<u8>>>,
}

impl MemoryBinStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Mutex::new(Some(data)),
        }
    }
}

impl BinStore for MemoryBinStore {
    fn exists(&self) -> bool {
        self.data.lock().map(|d| d.is_some()).unwrap_or(false)
    }

    fn load(&self) -> Result<Vec<u8>, StorageError> {
        self.data
            .lock()
            .ok()
            .and_then(|d| d.clone())
            .ok_or(StorageError::Empty)
    }

    fn save(&self, data: &[u8]) -> Result<(), StorageError> {
        if let Ok(mut slot) = self.data.lock() {
            *slot = Some(data.to_vec());
        }
        Ok(())
    }
}
