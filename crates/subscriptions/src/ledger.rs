//! The transaction ledger.
//!
//! RocksDB-backed, keyed by transaction id, with secondary indexes for the
//! confirmation engine (big-endian block number) and API lookups (from/to
//! address). Block-number keys sort numerically, so index scans come back
//! in ascending block order without post-sorting.

use crate::errors::SubscriptionError;
use serde::{Deserialize, Serialize};
use shared_types::TransferRecord;
use storage::KvDb;

pub const CF_RECORDS: &str = "records";
pub const CF_BLOCK_INDEX: &str = "block_index";
pub const CF_ADDR_INDEX: &str = "addr_index";

const ADDR_KEY_SEPARATOR: u8 = b'/';

/// A transfer as tracked by the engine. `ignore` marks internal sweep
/// transactions whose own notifications are suppressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    #[serde(flatten)]
    pub transfer: TransferRecord,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
}

impl LedgerRecord {
    pub fn new(transfer: TransferRecord) -> Self {
        Self {
            transfer,
            ignore: false,
        }
    }
}

fn block_key(block_number: u64, tx_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + tx_id.len());
    key.extend_from_slice(&block_number.to_be_bytes());
    key.extend_from_slice(tx_id.as_bytes());
    key
}

fn addr_key(address: &str, tx_id: &str) -> Vec<u8> {
    let mut key = address.to_lowercase().into_bytes();
    key.push(ADDR_KEY_SEPARATOR);
    key.extend_from_slice(tx_id.as_bytes());
    key
}

/// Single-writer ledger; the engine's event loop owns all mutations.
pub struct TxLedger {
    db: KvDb,
}

impl TxLedger {
    pub fn new(db: KvDb) -> Self {
        Self { db }
    }

    pub fn get(&self, tx_id: &str) -> Result<Option<LedgerRecord>, SubscriptionError> {
        match self.db.get(CF_RECORDS, tx_id.as_bytes())? {
            None => Ok(None),
            Some(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| SubscriptionError::Payload(e.to_string())),
        }
    }

    /// Insert or update a record, keeping the indexes in step. A block
    /// change (mempool → block promotion) moves the block-index entry.
    pub fn upsert(&self, record: &LedgerRecord) -> Result<(), SubscriptionError> {
        let tx_id = &record.transfer.tx_id;
        let payload = serde_json::to_vec(record)
            .map_err(|e| SubscriptionError::Payload(e.to_string()))?;
        let previous = self.get(tx_id)?;

        let mut batch = self.db.batch();
        batch.put(CF_RECORDS, tx_id.as_bytes(), &payload)?;
        if let Some(previous) = &previous {
            if previous.transfer.block_number != record.transfer.block_number {
                batch.delete(
                    CF_BLOCK_INDEX,
                    &block_key(previous.transfer.block_number, tx_id),
                )?;
            }
        }
        batch.put(
            CF_BLOCK_INDEX,
            &block_key(record.transfer.block_number, tx_id),
            &[],
        )?;
        if !record.transfer.from.is_empty() {
            batch.put(CF_ADDR_INDEX, &addr_key(&record.transfer.from, tx_id), &[])?;
        }
        if !record.transfer.to.is_empty() {
            batch.put(CF_ADDR_INDEX, &addr_key(&record.transfer.to, tx_id), &[])?;
        }
        batch.commit()?;
        Ok(())
    }

    /// Unconfirmed in-block transactions with `block_number <= threshold`,
    /// ascending — the set that crosses the confirmation threshold.
    pub fn unconfirmed_upto(&self, threshold: u64) -> Result<Vec<LedgerRecord>, SubscriptionError> {
        self.scan_unconfirmed(|block| block <= threshold)
    }

    /// Unconfirmed in-block transactions with `block_number > threshold`,
    /// ascending — the still-waiting set that gets progress notifications.
    pub fn unconfirmed_after(
        &self,
        threshold: u64,
    ) -> Result<Vec<LedgerRecord>, SubscriptionError> {
        self.scan_unconfirmed(|block| block > threshold)
    }

    fn scan_unconfirmed(
        &self,
        in_range: impl Fn(u64) -> bool,
    ) -> Result<Vec<LedgerRecord>, SubscriptionError> {
        let mut tx_ids = Vec::new();
        self.db.scan(CF_BLOCK_INDEX, |key, _| {
            if key.len() > 8 {
                let mut block_bytes = [0u8; 8];
                block_bytes.copy_from_slice(&key[..8]);
                let block = u64::from_be_bytes(block_bytes);
                if in_range(block) {
                    if let Ok(tx_id) = std::str::from_utf8(&key[8..]) {
                        tx_ids.push(tx_id.to_string());
                    }
                }
            }
            true
        })?;
        let mut records = Vec::new();
        for tx_id in tx_ids {
            if let Some(record) = self.get(&tx_id)? {
                if !record.transfer.confirmed && !record.transfer.in_pool {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }

    /// Every record where the address is sender or recipient, ascending by
    /// block number.
    pub fn for_address(&self, address: &str) -> Result<Vec<LedgerRecord>, SubscriptionError> {
        let mut prefix = address.to_lowercase().into_bytes();
        prefix.push(ADDR_KEY_SEPARATOR);
        let mut tx_ids = Vec::new();
        self.db.scan_prefix(CF_ADDR_INDEX, &prefix, |key, _| {
            if let Ok(tx_id) = std::str::from_utf8(&key[prefix.len()..]) {
                tx_ids.push(tx_id.to_string());
            }
            true
        })?;
        let mut records = Vec::new();
        for tx_id in tx_ids {
            if let Some(record) = self.get(&tx_id)? {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.transfer.block_number);
        Ok(records)
    }
}
