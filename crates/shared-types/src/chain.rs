//! The chain client capability set.
//!
//! The watcher, the subscription engine and the RPC endpoint all consume a
//! chain through these traits, never through a concrete client type. The
//! split mirrors how the operations are used: static metadata, read-side
//! polling, balance queries and transfer submission.

use crate::codec::AddressCodec;
use crate::errors::ChainError;
use crate::transfer::{BlockSummary, TokenInfo, TransferRecord};
use async_trait::async_trait;
use primitive_types::U256;
use std::sync::Arc;

/// Static chain metadata.
pub trait ChainInfo: Send + Sync {
    fn chain_name(&self) -> &str;
    fn chain_id(&self) -> &str;
    fn chain_symbol(&self) -> &str;
    fn decimals(&self) -> u32;
    /// Confirmation threshold after which a transaction is settled.
    fn min_confirmations(&self) -> u64;
    fn tokens(&self) -> Vec<TokenInfo>;
    fn token_protocols(&self) -> Vec<String>;
    fn address_codec(&self) -> Arc<dyn AddressCodec>;
}

/// Read-side chain access used by the watch loop.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Latest canonical block height.
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Fetch and decode a block. With `full` set the transactions are run
    /// through the classification pipeline; otherwise only ids are kept.
    async fn block_by_number(&self, number: u64, full: bool) -> Result<BlockSummary, ChainError>;

    /// Decoded transfers currently pending in the node's mempool, with
    /// `in_pool` set.
    async fn mempool_content(&self) -> Result<Vec<TransferRecord>, ChainError>;

    /// Look up a single transaction and decorate it with the current
    /// confirmation count.
    async fn transfer_by_hash(&self, tx_id: &str) -> Result<TransferRecord, ChainError>;

    async fn transfer_by_position(
        &self,
        block_number: u64,
        index: u32,
    ) -> Result<TransferRecord, ChainError>;
}

/// Balance queries.
#[async_trait]
pub trait ChainBalances: Send + Sync {
    async fn balance_of(&self, address: &str) -> Result<U256, ChainError>;
    async fn token_balance_of(&self, address: &str, symbol: &str) -> Result<U256, ChainError>;
}

/// Transfer construction and submission.
#[async_trait]
pub trait ChainTransfers: Send + Sync {
    /// Sign and submit a native-coin transfer of `amount`.
    async fn transfer_by_key(
        &self,
        private_key: &[u8],
        from: &str,
        to: &str,
        amount: U256,
    ) -> Result<String, ChainError>;

    /// Sign and submit a transfer of the entire balance net of the
    /// estimated fee. Fails with [`ChainError::NothingToTransfer`] when the
    /// remainder is non-positive.
    async fn transfer_all_by_key(
        &self,
        private_key: &[u8],
        from: &str,
        to: &str,
    ) -> Result<String, ChainError>;

    async fn estimated_fee(&self, from: &str, to: &str, amount: U256)
        -> Result<U256, ChainError>;

    /// Token-transfer submission is not wired up yet; implementations
    /// return [`ChainError::TokenTransfers`].
    async fn token_transfer_by_key(
        &self,
        private_key: &[u8],
        from: &str,
        to: &str,
        amount: U256,
        symbol: &str,
    ) -> Result<String, ChainError>;

    async fn token_estimated_fee(
        &self,
        from: &str,
        to: &str,
        amount: U256,
        symbol: &str,
    ) -> Result<U256, ChainError>;
}

/// The full client a chain adapter supplies.
pub trait ChainClient: ChainInfo + ChainReader + ChainBalances + ChainTransfers {}

impl<T: ChainInfo + ChainReader + ChainBalances + ChainTransfers> ChainClient for T {}

/// Read-through transaction mirror queried by the RPC endpoint.
#[async_trait]
pub trait TransferCache: Send + Sync {
    async fn transfer_info(&self, tx_id: &str) -> Result<TransferRecord, ChainError>;
    async fn transfers_for_address(&self, address: &str)
        -> Result<Vec<TransferRecord>, ChainError>;
}
