//! Transaction classification and block decoding.
//!
//! The pipeline turns raw node transactions into [`TransferRecord`]s:
//!
//! - empty input ⇒ native-coin transfer (zero-value transfers are valid
//!   on chain and still classify),
//! - non-empty input ⇒ the `to` address must be a known token contract
//!   and the selector must be `transfer(address,uint256)`, in which case
//!   the recipient and amount are rewritten from the decoded arguments,
//! - everything else is a first-class skip, reported as `Ok(None)` and
//!   noted at debug level.

use crate::client::EvmClient;
use crate::wire::{BlockTransactions, RpcBlock, RpcTransaction};
use async_trait::async_trait;
use primitive_types::U256;
use shared_types::hexnum::parse_hex_bytes;
use shared_types::{BlockSummary, ChainError, ChainInfo, ChainReader, TransferRecord};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl EvmClient {
    /// Classify one raw transaction. `Ok(None)` means "not a transfer" —
    /// a normal outcome, not a failure.
    pub(crate) fn transaction_decode(
        &self,
        tx: &RpcTransaction,
    ) -> Result<Option<TransferRecord>, ChainError> {
        let fee = tx.gas_price * U256::from(tx.gas);
        let mut record = TransferRecord {
            tx_id: tx.hash.clone(),
            block_number: tx.block_number,
            success: true,
            timestamp: unix_now(),
            from: self.normalize_address(&tx.from),
            to: self.normalize_address(&tx.to),
            fee,
            ..Default::default()
        };

        let input_empty = tx.input.is_empty() || tx.input == "0x";
        if input_empty {
            record.transfer = true;
            record.native_coin = true;
            record.amount = tx.value;
            record.symbol = self.chain_symbol().to_string();
            record.decimals = self.decimals();
            return Ok(Some(record));
        }

        if tx.to.is_empty() || tx.to == "0x" {
            debug!(tx = %tx.hash, "contract creation, not a transfer");
            return Ok(None);
        }
        let contract_address = self.normalize_address(&tx.to);
        let Ok(token) = self.registry.by_address(&contract_address) else {
            debug!(tx = %tx.hash, contract = %contract_address, "unknown contract, skipping");
            return Ok(None);
        };
        let Ok(call_data) = parse_hex_bytes(&tx.input) else {
            debug!(tx = %tx.hash, "unparseable call data, skipping");
            return Ok(None);
        };
        if !self.erc20.is_transfer(&call_data) {
            debug!(tx = %tx.hash, "unknown method selector, skipping");
            return Ok(None);
        }
        let (recipient, amount) = match self.erc20.decode_transfer(&call_data) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(tx = %tx.hash, error = %e, "malformed transfer call data, skipping");
                return Ok(None);
            }
        };

        record.transfer = true;
        record.smart_contract = true;
        record.token_name = token.name;
        record.token_symbol = token.symbol;
        record.decimals = token.decimals;
        record.to = self
            .codec
            .encode(&recipient)
            .unwrap_or_else(|_| record.to.clone());
        record.amount = amount;
        Ok(Some(record))
    }

    pub(crate) fn block_decode(&self, block: &RpcBlock) -> BlockSummary {
        let mut summary = BlockSummary {
            id: block.hash.clone(),
            number: block.number,
            parent_hash: block.parent_hash.clone(),
            timestamp: block.timestamp,
            transactions: Vec::new(),
        };
        match &block.transactions {
            BlockTransactions::Full(txs) => {
                for tx in txs {
                    match self.transaction_decode(tx) {
                        Ok(Some(mut record)) => {
                            record.in_pool = false;
                            record.timestamp = block.timestamp;
                            record.block_number = block.number;
                            summary.transactions.push(record);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            debug!(error = %e, "skipping undecodable transaction");
                        }
                    }
                }
            }
            BlockTransactions::Hashes(hashes) => {
                summary.transactions = hashes
                    .iter()
                    .map(|hash| TransferRecord {
                        tx_id: hash.clone(),
                        ..Default::default()
                    })
                    .collect();
            }
        }
        summary
    }

    fn decorate_confirmations(&self, record: &mut TransferRecord, current_block: u64) {
        if record.block_number == 0 {
            record.in_pool = true;
            return;
        }
        let depth = current_block.saturating_sub(record.block_number);
        record.confirmations = depth + 1;
        record.confirmed = depth >= self.min_confirmations().saturating_sub(1);
    }
}

#[async_trait]
impl ChainReader for EvmClient {
    async fn block_number(&self) -> Result<u64, ChainError> {
        self.get_block_number().await
    }

    async fn block_by_number(&self, number: u64, full: bool) -> Result<BlockSummary, ChainError> {
        let block = self.get_block_by_number(number, full).await?;
        Ok(self.block_decode(&block))
    }

    async fn mempool_content(&self) -> Result<Vec<TransferRecord>, ChainError> {
        let pool = self.get_txpool_content().await?;
        let mut content = Vec::new();
        for by_sender in pool.pending.values().chain(pool.queued.values()) {
            for tx in by_sender.values() {
                match self.transaction_decode(tx) {
                    Ok(Some(mut record)) => {
                        record.in_pool = true;
                        record.block_number = 0;
                        content.push(record);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!(error = %e, "skipping undecodable pool transaction");
                    }
                }
            }
        }
        Ok(content)
    }

    async fn transfer_by_hash(&self, tx_id: &str) -> Result<TransferRecord, ChainError> {
        let tx = self.get_transaction_by_hash(tx_id).await?;
        let mut record = self
            .transaction_decode(&tx)?
            .ok_or(ChainError::UnknownTransaction)?;
        let current_block = self.get_block_number().await.unwrap_or(0);
        self.decorate_confirmations(&mut record, current_block);
        Ok(record)
    }

    async fn transfer_by_position(
        &self,
        block_number: u64,
        index: u32,
    ) -> Result<TransferRecord, ChainError> {
        let tx = self
            .get_transaction_by_block_and_index(block_number, index)
            .await?;
        let mut record = self
            .transaction_decode(&tx)?
            .ok_or(ChainError::UnknownTransaction)?;
        let current_block = self.get_block_number().await.unwrap_or(0);
        self.decorate_confirmations(&mut record, current_block);
        Ok(record)
    }
}
