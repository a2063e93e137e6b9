//! Typed wrappers over the consumed node methods.

use crate::client::EvmClient;
use crate::jsonrpc::RpcRequest;
use crate::wire::{RpcBlock, RpcTransaction, TxPoolContent};
use primitive_types::U256;
use serde::Serialize;
use serde_json::Value;
use shared_types::hexnum::{bytes_to_hex, parse_hex_u256, parse_hex_u64, u256_to_hex, u64_to_hex};
use shared_types::ChainError;

const ETH_CHAIN_ID: &str = "eth_chainId";
const ETH_GET_BALANCE: &str = "eth_getBalance";
const ETH_GET_TRANSACTION_BY_HASH: &str = "eth_getTransactionByHash";
const ETH_GET_TRANSACTION_BY_BLOCK_NUMBER_AND_INDEX: &str =
    "eth_getTransactionByBlockNumberAndIndex";
const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
const ETH_GET_BLOCK_BY_HASH: &str = "eth_getBlockByHash";
const ETH_GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
const ETH_ESTIMATE_GAS: &str = "eth_estimateGas";
const ETH_GAS_PRICE: &str = "eth_gasPrice";
const ETH_SEND_RAW_TRANSACTION: &str = "eth_sendRawTransaction";
const ETH_GET_TRANSACTION_COUNT: &str = "eth_getTransactionCount";
const ETH_CALL: &str = "eth_call";
const TXPOOL_CONTENT: &str = "txpool_content";

const TAG_LATEST: &str = "latest";
const TAG_PENDING: &str = "pending";

#[derive(Debug, Default, Serialize)]
struct CallRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    from: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    value: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    input: String,
}

impl EvmClient {
    async fn call_node(&self, request: RpcRequest) -> Result<Value, ChainError> {
        self.transport.call(request).await?.raw_result()
    }

    /// The numeric chain id used for EIP-155 replay protection.
    pub async fn get_chain_id(&self) -> Result<u64, ChainError> {
        let value: String = self
            .transport
            .call(RpcRequest::new(ETH_CHAIN_ID))
            .await?
            .into_result()?;
        parse_hex_u64(&value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    pub async fn get_block_number(&self) -> Result<u64, ChainError> {
        let value: String = self
            .transport
            .call(RpcRequest::new(ETH_BLOCK_NUMBER))
            .await?
            .into_result()?;
        parse_hex_u64(&value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    /// Balance in wei at the latest block.
    pub async fn get_balance(&self, address: &str) -> Result<U256, ChainError> {
        let value: String = self
            .transport
            .call(RpcRequest::new(ETH_GET_BALANCE).param(address).param(TAG_LATEST))
            .await?
            .into_result()?;
        parse_hex_u256(&value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    /// Current gas price in wei, from the node's recent-block median.
    pub async fn get_gas_price(&self) -> Result<U256, ChainError> {
        let value: String = self
            .transport
            .call(RpcRequest::new(ETH_GAS_PRICE))
            .await?
            .into_result()?;
        parse_hex_u256(&value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    pub async fn get_block_by_number(
        &self,
        number: u64,
        full_transactions: bool,
    ) -> Result<RpcBlock, ChainError> {
        let value = self
            .call_node(
                RpcRequest::new(ETH_GET_BLOCK_BY_NUMBER)
                    .param(u64_to_hex(number))
                    .param(full_transactions),
            )
            .await?;
        if value.is_null() {
            return Err(ChainError::InvalidResponse(format!(
                "block {number} not available"
            )));
        }
        serde_json::from_value(value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    pub async fn get_block_by_hash(
        &self,
        hash: &str,
        full_transactions: bool,
    ) -> Result<RpcBlock, ChainError> {
        let value = self
            .call_node(
                RpcRequest::new(ETH_GET_BLOCK_BY_HASH)
                    .param(hash)
                    .param(full_transactions),
            )
            .await?;
        if value.is_null() {
            return Err(ChainError::InvalidResponse(format!(
                "block {hash} not available"
            )));
        }
        serde_json::from_value(value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    pub async fn get_transaction_by_hash(
        &self,
        hash: &str,
    ) -> Result<RpcTransaction, ChainError> {
        let value = self
            .call_node(RpcRequest::new(ETH_GET_TRANSACTION_BY_HASH).param(hash))
            .await?;
        if value.is_null() {
            return Err(ChainError::TransactionNotFound);
        }
        serde_json::from_value(value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    pub async fn get_transaction_by_block_and_index(
        &self,
        block_number: u64,
        index: u32,
    ) -> Result<RpcTransaction, ChainError> {
        let value = self
            .call_node(
                RpcRequest::new(ETH_GET_TRANSACTION_BY_BLOCK_NUMBER_AND_INDEX)
                    .param(u64_to_hex(block_number))
                    .param(u64_to_hex(index as u64)),
            )
            .await?;
        if value.is_null() {
            return Err(ChainError::TransactionNotFound);
        }
        serde_json::from_value(value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    /// Next nonce for an account, counting pending transactions.
    pub async fn get_pending_nonce(&self, address: &str) -> Result<u64, ChainError> {
        let value: String = self
            .transport
            .call(
                RpcRequest::new(ETH_GET_TRANSACTION_COUNT)
                    .param(address)
                    .param(TAG_PENDING),
            )
            .await?
            .into_result()?;
        parse_hex_u64(&value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    pub async fn estimate_gas(
        &self,
        from: &str,
        to: &str,
        data: &str,
        amount: U256,
    ) -> Result<u64, ChainError> {
        let request = CallRequest {
            from: from.to_string(),
            to: to.to_string(),
            value: if amount.is_zero() {
                String::new()
            } else {
                u256_to_hex(amount)
            },
            input: data.to_string(),
        };
        let value: String = self
            .transport
            .call(RpcRequest::new(ETH_ESTIMATE_GAS).param(request))
            .await?
            .into_result()?;
        parse_hex_u64(&value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    /// Read-only contract execution at the latest block.
    pub async fn eth_call(&self, contract_address: &str, data: &str) -> Result<String, ChainError> {
        let request = CallRequest {
            to: contract_address.to_string(),
            input: data.to_string(),
            ..Default::default()
        };
        self.transport
            .call(RpcRequest::new(ETH_CALL).param(request).param(TAG_LATEST))
            .await?
            .into_result()
    }

    /// Submit a signed RLP payload; returns the transaction hash.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, ChainError> {
        self.transport
            .call(RpcRequest::new(ETH_SEND_RAW_TRANSACTION).param(bytes_to_hex(raw)))
            .await?
            .into_result()
    }

    pub async fn get_txpool_content(&self) -> Result<TxPoolContent, ChainError> {
        self.transport
            .call(RpcRequest::new(TXPOOL_CONTENT))
            .await?
            .into_result()
    }
}
