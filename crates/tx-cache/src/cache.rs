//! The cache manager: bus listener, serialized update loop and the query
//! surface behind the [`TransferCache`] trait.

use crate::config::TxCacheConfig;
use crate::errors::TxCacheError;
use crate::{CF_ADDR_INDEX, CF_BLOCK_INDEX, CF_RECORDS};
use async_trait::async_trait;
use shared_bus::{BlockEvent, EventListener, TransactionEvent};
use shared_types::{ChainError, TransferCache, TransferRecord};
use std::sync::Arc;
use storage::KvDb;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

const ADDR_KEY_SEPARATOR: u8 = b'/';

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

enum CacheEvent {
    Block(u64),
    Transfer(TransferRecord),
    Flush(tokio::sync::oneshot::Sender<()>),
}

struct CacheInner {
    config: TxCacheConfig,
    db: KvDb,
}

impl CacheInner {
    fn store(&self, mut record: TransferRecord) {
        if !record.in_pool && record.confirmations == 0 {
            record.confirmations = 1;
        }
        if let Err(e) = self.upsert(&record) {
            error!(tx = %record.tx_id, error = %e, "can not cache transaction");
        }
    }

    fn upsert(&self, record: &TransferRecord) -> Result<(), TxCacheError> {
        let payload =
            serde_json::to_vec(record).map_err(|e| TxCacheError::Payload(e.to_string()))?;
        let previous = self.get(&record.tx_id)?;
        let mut batch = self.db.batch();
        batch.put(CF_RECORDS, record.tx_id.as_bytes(), &payload)?;
        if let Some(previous) = &previous {
            if previous.block_number != record.block_number {
                batch.delete(
                    CF_BLOCK_INDEX,
                    &block_key(previous.block_number, &record.tx_id),
                )?;
            }
        }
        batch.put(
            CF_BLOCK_INDEX,
            &block_key(record.block_number, &record.tx_id),
            &[],
        )?;
        if !record.from.is_empty() {
            batch.put(CF_ADDR_INDEX, &addr_key(&record.from, &record.tx_id), &[])?;
        }
        if !record.to.is_empty() {
            batch.put(CF_ADDR_INDEX, &addr_key(&record.to, &record.tx_id), &[])?;
        }
        batch.commit()?;
        Ok(())
    }

    fn get(&self, tx_id: &str) -> Result<Option<TransferRecord>, TxCacheError> {
        match self.db.get(CF_RECORDS, tx_id.as_bytes())? {
            None => Ok(None),
            Some(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| TxCacheError::Payload(e.to_string())),
        }
    }

    /// Advance confirmation counts inside the lookback window.
    fn block_update(&self, block_number: u64) {
        if self.config.debug {
            debug!(block = block_number, "cache block update");
        }
        let floor = block_number.saturating_sub(self.config.register_confirmations);
        let mut tx_ids = Vec::new();
        let scan = self
            .db
            .scan_from(CF_BLOCK_INDEX, &floor.to_be_bytes(), |key, _| {
                if key.len() > 8 {
                    if let Ok(tx_id) = std::str::from_utf8(&key[8..]) {
                        tx_ids.push(tx_id.to_string());
                    }
                }
                true
            });
        if let Err(e) = scan {
            error!(error = %e, "can not scan cache block index");
            return;
        }
        for tx_id in tx_ids {
            let record = match self.get(&tx_id) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    error!(tx = %tx_id, error = %e, "can not load cached transaction");
                    continue;
                }
            };
            if record.in_pool || record.block_number > block_number {
                continue;
            }
            let mut updated = record;
            updated.confirmations = block_number - updated.block_number + 1;
            updated.confirmed = updated.confirmations >= self.config.confirmations;
            if let Err(e) = self.upsert(&updated) {
                error!(tx = %updated.tx_id, error = %e, "can not update cached transaction");
            }
        }
    }
}

/// The cache handle: enqueue side of the update loop plus queries.
pub struct TxCacheManager {
    inner: Arc<CacheInner>,
    sender: mpsc::UnboundedSender<CacheEvent>,
}

impl TxCacheManager {
    pub fn new(config: TxCacheConfig, db: KvDb) -> (Arc<Self>, JoinHandle<()>) {
        let inner = Arc::new(CacheInner { config, db });
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let loop_inner = inner.clone();
        let handle = tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match event {
                    CacheEvent::Transfer(record) => loop_inner.store(record),
                    CacheEvent::Block(number) => loop_inner.block_update(number),
                    CacheEvent::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            debug!("tx cache loop exiting");
        });
        (Arc::new(Self { inner, sender }), handle)
    }

    /// Wait until every event enqueued so far has been processed.
    pub async fn drain(&self) {
        let (ack, done) = tokio::sync::oneshot::channel();
        if self.sender.send(CacheEvent::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

impl EventListener for TxCacheManager {
    fn on_block(&self, event: &BlockEvent) {
        let _ = self.sender.send(CacheEvent::Block(event.number));
    }

    fn on_transaction(&self, event: &TransactionEvent) {
        let _ = self
            .sender
            .send(CacheEvent::Transfer(event.transfer.clone()));
    }
}

#[async_trait]
impl TransferCache for TxCacheManager {
    async fn transfer_info(&self, tx_id: &str) -> Result<TransferRecord, ChainError> {
        self.inner
            .get(tx_id)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?
            .ok_or(ChainError::UnknownTransaction)
    }

    async fn transfers_for_address(
        &self,
        address: &str,
    ) -> Result<Vec<TransferRecord>, ChainError> {
        let mut prefix = address.to_lowercase().into_bytes();
        prefix.push(ADDR_KEY_SEPARATOR);
        let mut tx_ids = Vec::new();
        self.inner
            .db
            .scan_prefix(CF_ADDR_INDEX, &prefix, |key, _| {
                if let Ok(tx_id) = std::str::from_utf8(&key[prefix.len()..]) {
                    tx_ids.push(tx_id.to_string());
                }
                true
            })
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        let mut records = Vec::new();
        for tx_id in tx_ids {
            if let Some(record) = self
                .inner
                .get(&tx_id)
                .map_err(|e| ChainError::InvalidResponse(e.to_string()))?
            {
                records.push(record);
            }
        }
        records.sort_by_key(|r| r.timestamp);
        Ok(records)
    }
}
