//! Wire types for node responses.
//!
//! Nodes encode numeric fields as `0x`-prefixed hex strings, with null for
//! pending-block fields and a bare `"0x"` zero for `gas`, `nonce` and
//! `transactionIndex` on some implementations. Each wire type deserializes
//! through a raw string-typed proxy and converts explicitly.

use primitive_types::U256;
use serde::Deserialize;
use serde_json::Value;
use shared_types::errors::HexError;
use shared_types::hexnum::{parse_hex_u256, parse_hex_u64};
use std::collections::HashMap;

/// A transaction as returned by `eth_getTransaction*`, block bodies and
/// `txpool_content`.
#[derive(Debug, Clone, Default)]
pub struct RpcTransaction {
    pub hash: String,
    pub block_hash: String,
    /// Zero while the transaction is pending.
    pub block_number: u64,
    pub from: String,
    /// Empty for contract creation.
    pub to: String,
    pub gas: u64,
    pub gas_price: U256,
    pub value: U256,
    /// Raw `0x`-prefixed call-data.
    pub input: String,
    pub nonce: u64,
    pub transaction_index: u64,
    pub kind: u64,
    pub chain_id: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTransaction {
    hash: Option<String>,
    #[serde(rename = "blockHash")]
    block_hash: Option<String>,
    #[serde(rename = "blockNumber")]
    block_number: Option<String>,
    from: Option<String>,
    to: Option<String>,
    gas: Option<String>,
    #[serde(rename = "gasPrice")]
    gas_price: Option<String>,
    value: Option<String>,
    input: Option<String>,
    nonce: Option<String>,
    #[serde(rename = "transactionIndex")]
    transaction_index: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(rename = "chainId")]
    chain_id: Option<String>,
}

fn quantity(field: Option<&String>) -> Result<u64, HexError> {
    match field {
        Some(s) if !s.is_empty() => parse_hex_u64(s),
        _ => Ok(0),
    }
}

fn big_quantity(field: Option<&String>) -> Result<U256, HexError> {
    match field {
        Some(s) if !s.is_empty() => parse_hex_u256(s),
        _ => Ok(U256::zero()),
    }
}

impl TryFrom<RawTransaction> for RpcTransaction {
    type Error = HexError;

    fn try_from(raw: RawTransaction) -> Result<Self, HexError> {
        Ok(Self {
            hash: raw.hash.unwrap_or_default(),
            block_hash: raw.block_hash.unwrap_or_default(),
            block_number: quantity(raw.block_number.as_ref())?,
            from: raw.from.unwrap_or_default(),
            to: raw.to.unwrap_or_default(),
            gas: quantity(raw.gas.as_ref())?,
            gas_price: big_quantity(raw.gas_price.as_ref())?,
            value: big_quantity(raw.value.as_ref())?,
            input: raw.input.unwrap_or_default(),
            nonce: quantity(raw.nonce.as_ref())?,
            transaction_index: quantity(raw.transaction_index.as_ref())?,
            kind: quantity(raw.kind.as_ref())?,
            chain_id: quantity(raw.chain_id.as_ref())?,
        })
    }
}

impl<'de> Deserialize<'de> for RpcTransaction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTransaction::deserialize(deserializer)?;
        RpcTransaction::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Block transactions arrive either as hashes or as full objects,
/// depending on the request flag.
#[derive(Debug, Clone)]
pub enum BlockTransactions {
    Hashes(Vec<String>),
    Full(Vec<RpcTransaction>),
}

impl Default for BlockTransactions {
    fn default() -> Self {
        BlockTransactions::Hashes(Vec::new())
    }
}

/// A block header plus its transactions.
#[derive(Debug, Clone, Default)]
pub struct RpcBlock {
    pub number: u64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: i64,
    pub transactions: BlockTransactions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBlock {
    number: Option<String>,
    hash: Option<String>,
    #[serde(rename = "parentHash")]
    parent_hash: Option<String>,
    timestamp: Option<String>,
    transactions: Value,
}

impl<'de> Deserialize<'de> for RpcBlock {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let raw = RawBlock::deserialize(deserializer)?;
        let transactions = match &raw.transactions {
            Value::Null => BlockTransactions::default(),
            Value::Array(items) if items.iter().all(Value::is_string) => BlockTransactions::Hashes(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect(),
            ),
            Value::Array(_) => BlockTransactions::Full(
                serde_json::from_value(raw.transactions.clone()).map_err(D::Error::custom)?,
            ),
            _ => return Err(D::Error::custom("unexpected transactions field")),
        };
        Ok(Self {
            number: quantity(raw.number.as_ref()).map_err(D::Error::custom)?,
            hash: raw.hash.unwrap_or_default(),
            parent_hash: raw.parent_hash.unwrap_or_default(),
            timestamp: quantity(raw.timestamp.as_ref()).map_err(D::Error::custom)? as i64,
            transactions,
        })
    }
}

/// `txpool_content`: sender → nonce → transaction, for both queues.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TxPoolContent {
    pub pending: HashMap<String, HashMap<String, RpcTransaction>>,
    pub queued: HashMap<String, HashMap<String, RpcTransaction>>,
}
