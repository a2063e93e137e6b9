//! RocksDB wrapper with named column families.
//!
//! Each module opens its own database directory; column families isolate
//! the primary records from their secondary indexes so a range scan never
//! pages through unrelated data.

use crate::errors::StorageError;
use rocksdb::{
    ColumnFamilyDescriptor, DBCompressionType, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::path::Path;

pub struct KvDb {
    db: DB,
}

impl KvDb {
    /// Open (or create) a database with the given column families.
    pub fn open(path: &Path, column_families: &[&str]) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(DBCompressionType::Snappy);
        let descriptors: Vec<ColumnFamilyDescriptor> = column_families
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;
        Ok(Self { db })
    }

    pub fn put(&self, cf: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.db.put_cf(self.cf(cf)?, key, value)?;
        Ok(())
    }

    pub fn get(&self, cf: &str, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.db.get_cf(self.cf(cf)?, key)?)
    }

    pub fn delete(&self, cf: &str, key: &[u8]) -> Result<(), StorageError> {
        self.db.delete_cf(self.cf(cf)?, key)?;
        Ok(())
    }

    /// Start an atomic multi-write.
    pub fn batch(&self) -> KvBatch<'_> {
        KvBatch {
            db: self,
            batch: WriteBatch::default(),
        }
    }

    /// Visit every `(key, value)` pair in key order. The visitor returns
    /// `false` to stop early.
    pub fn scan(
        &self,
        cf: &str,
        mut visit: impl FnMut(&[u8], &[u8]) -> bool,
    ) -> Result<(), StorageError> {
        let iter = self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start);
        for entry in iter {
            let (key, value) = entry?;
            if !visit(&key, &value) {
                break;
            }
        }
        Ok(())
    }

    /// Visit pairs in key order starting from `start` (inclusive).
    pub fn scan_from(
        &self,
        cf: &str,
        start: &[u8],
        mut visit: impl FnMut(&[u8], &[u8]) -> bool,
    ) -> Result<(), StorageError> {
        let iter = self
            .db
            .iterator_cf(self.cf(cf)?, IteratorMode::From(start, Direction::Forward));
        for entry in iter {
            let (key, value) = entry?;
            if !visit(&key, &value) {
                break;
            }
        }
        Ok(())
    }

    /// Visit pairs whose key starts with `prefix`, in key order.
    pub fn scan_prefix(
        &self,
        cf: &str,
        prefix: &[u8],
        mut visit: impl FnMut(&[u8], &[u8]) -> bool,
    ) -> Result<(), StorageError> {
        self.scan_from(cf, prefix, |key, value| {
            if !key.starts_with(prefix) {
                return false;
            }
            visit(key, value)
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::UnknownColumnFamily(name.to_string()))
    }
}

/// An atomic write batch over one [`KvDb`].
pub struct KvBatch<'a> {
    db: &'a KvDb,
    batch: WriteBatch,
}

impl KvBatch<'_> {
    pub fn put(&mut self, cf: &str, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.batch.put_cf(self.db.cf(cf)?, key, value);
        Ok(())
    }

    pub fn delete(&mut self, cf: &str, key: &[u8]) -> Result<(), StorageError> {
        self.batch.delete_cf(self.db.cf(cf)?, key);
        Ok(())
    }

    pub fn commit(self) -> Result<(), StorageError> {
        self.db.db.write(self.batch)?;
        Ok(())
    }
}
