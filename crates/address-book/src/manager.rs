//! The address pool manager.

use crate::bip44;
use crate::config::AddressBookConfig;
use crate::errors::AddressError;
use crate::record::AddressRecord;
use crate::CF_ADDRESSES;
use parking_lot::RwLock;
use shared_crypto::KeyPair;
use shared_types::AddressCodec;
use std::collections::HashMap;
use std::sync::Arc;
use storage::KvDb;
use tracing::{debug, error, info};

struct Inner {
    /// Lowercased address → record. The lowercase key makes `is_known`
    /// insensitive to checksum casing.
    all: HashMap<String, AddressRecord>,
}

/// Thread-safe address store over a RocksDB table.
///
/// Readers (the watcher, the subscription engine, the endpoint) take the
/// read lock; pool updates take the write lock.
pub struct AddressBook {
    db: KvDb,
    codec: Arc<dyn AddressCodec>,
    config: AddressBookConfig,
    inner: RwLock<Inner>,
}

impl AddressBook {
    /// Load all records and top up the free pool.
    pub fn open(
        db: KvDb,
        codec: Arc<dyn AddressCodec>,
        config: AddressBookConfig,
    ) -> Result<Self, AddressError> {
        let book = Self {
            db,
            codec,
            config,
            inner: RwLock::new(Inner {
                all: HashMap::new(),
            }),
        };
        book.preload()?;
        book.check_free_pool()?;
        let (total, free) = book.pool_stats();
        info!(total, free, "address pool loaded");
        Ok(book)
    }

    fn preload(&self) -> Result<(), AddressError> {
        let mut records = Vec::new();
        self.db.scan(CF_ADDRESSES, |_key, raw| {
            match AddressRecord::decode(raw) {
                Ok(record) => records.push(record),
                Err(e) => error!(error = %e, "dropping undecodable address record"),
            }
            true
        })?;
        let mut inner = self.inner.write();
        for record in records {
            inner.all.insert(record.address.to_lowercase(), record);
        }
        Ok(())
    }

    /// The watcher's hot path.
    pub fn is_known(&self, address: &str) -> bool {
        !address.is_empty() && self.inner.read().all.contains_key(&address.to_lowercase())
    }

    pub fn get(&self, address: &str) -> Result<AddressRecord, AddressError> {
        self.inner
            .read()
            .all
            .get(&address.to_lowercase())
            .cloned()
            .ok_or(AddressError::Unknown)
    }

    /// `(total, free)` record counts.
    pub fn pool_stats(&self) -> (usize, usize) {
        let inner = self.inner.read();
        let free = inner.all.values().filter(|r| !r.subscribed).count();
        (inner.all.len(), free)
    }

    /// Build, validate and persist a new record for an already-encoded
    /// address string. `fill` sets key material and subscription fields.
    pub fn insert_with(
        &self,
        address: &str,
        fill: impl FnOnce(&mut AddressRecord),
    ) -> Result<AddressRecord, AddressError> {
        let address_bytes = self.codec.decode(address)?;
        let mut record = AddressRecord {
            address: address.to_string(),
            address_bytes,
            ..Default::default()
        };
        fill(&mut record);
        record.validate(self.codec.as_ref())?;

        let key = record.address.to_lowercase();
        {
            let mut inner = self.inner.write();
            if inner.all.contains_key(&key) {
                return Err(AddressError::Exists);
            }
            self.persist(&record)?;
            inner.all.insert(key, record.clone());
        }
        Ok(record)
    }

    /// Draw an unsubscribed address from the pool and bind it to a
    /// subscription. Refills the pool afterwards when it runs low.
    pub fn take_free_and_subscribe(
        &self,
        service_id: u64,
        user_id: i64,
        invoice_id: i64,
        watch_only: bool,
    ) -> Result<AddressRecord, AddressError> {
        let record = {
            let mut inner = self.inner.write();
            let key = inner
                .all
                .iter()
                .find(|(_, r)| !r.subscribed)
                .map(|(k, _)| k.clone())
                .ok_or(AddressError::NoFreeAddresses)?;
            let record = match inner.all.get_mut(&key) {
                Some(record) => record,
                None => return Err(AddressError::NoFreeAddresses),
            };
            record.subscribed = true;
            record.service_id = service_id;
            record.user_id = user_id;
            record.invoice_id = invoice_id;
            // A keyless pool entry stays watch-only no matter what the
            // caller asked for.
            record.watch_only = watch_only || record.private_key.is_none();
            let record = record.clone();
            self.persist(&record)?;
            record
        };
        self.check_free_pool()?;
        Ok(record)
    }

    /// Generate a mnemonic-backed record without adding it to the pool.
    pub fn generate_bip44(&self, word_count: usize) -> Result<AddressRecord, AddressError> {
        bip44::generate(word_count, self.codec.as_ref())
    }

    /// Recover a record from a mnemonic without adding it to the pool.
    pub fn recover_bip44(&self, words: &[String]) -> Result<AddressRecord, AddressError> {
        bip44::recover(words, self.codec.as_ref())
    }

    fn check_free_pool(&self) -> Result<(), AddressError> {
        if !self.config.enable_generate {
            return Ok(());
        }
        let (total, free) = self.pool_stats();
        if total == 0 {
            self.refill(self.config.generate_up_to)?;
        } else if free < self.config.min_free_pool {
            self.refill(self.config.generate_up_to.saturating_sub(free))?;
        }
        Ok(())
    }

    fn refill(&self, count: usize) -> Result<(), AddressError> {
        for _ in 0..count {
            let record = if self.config.bip39 {
                bip44::generate(self.config.mnemonic_len, self.codec.as_ref())?
            } else {
                self.fresh_record()?
            };
            let key = record.address.to_lowercase();
            self.persist(&record)?;
            self.inner.write().all.insert(key, record);
        }
        debug!(count, "refilled free address pool");
        Ok(())
    }

    fn fresh_record(&self) -> Result<AddressRecord, AddressError> {
        let keypair = KeyPair::generate();
        let private_key = keypair.to_bytes().to_vec();
        let (address, address_bytes) = self.codec.address_from_key(&private_key)?;
        Ok(AddressRecord {
            address,
            address_bytes: address_bytes.to_vec(),
            private_key: Some(private_key),
            ..Default::default()
        })
    }

    fn persist(&self, record: &AddressRecord) -> Result<(), AddressError> {
        self.db.put(
            CF_ADDRESSES,
            record.address.to_lowercase().as_bytes(),
            &record.encode()?,
        )?;
        Ok(())
    }
}
