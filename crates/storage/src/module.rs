//! Per-module storage directories under the global data path.

use crate::bin_store::BinFileStore;
use crate::errors::StorageError;
use crate::kv::KvDb;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Owns the global data directory and hands out module sub-directories.
#[derive(Debug, Clone)]
pub struct StorageManager {
    root: PathBuf,
}

impl StorageManager {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    /// Storage scoped to one module, e.g. `watchdog`, `subscriptions`.
    pub fn module(&self, dir: &str) -> Result<ModuleStorage, StorageError> {
        let path = self.root.join(dir);
        if !path.exists() {
            fs::create_dir_all(&path)?;
            debug!(module = dir, "created module storage directory");
        }
        Ok(ModuleStorage { path })
    }
}

/// A module's slice of the data directory.
#[derive(Debug, Clone)]
pub struct ModuleStorage {
    path: PathBuf,
}

impl ModuleStorage {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A file-backed payload store inside the module directory.
    pub fn bin_file(&self, name: &str) -> BinFileStore {
        BinFileStore::new(self.path.join(name))
    }

    /// A RocksDB database inside the module directory.
    pub fn kv_db(&self, name: &str, column_families: &[&str]) -> Result<KvDb, StorageError> {
        KvDb::open(&self.path.join(name), column_families)
    }
}
