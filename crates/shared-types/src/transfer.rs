//! Transfer and block projections shared by every subsystem.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A token known to the adapter, carrying the metadata attached to decoded
/// token transfers and balance queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Contract address in checksummed string form.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub contract_address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
}

/// The semantic projection of a chain transaction.
///
/// Produced by the chain client's classification pipeline and carried
/// unchanged through the event bus into the subscription engine and the
/// transaction cache.
///
/// Invariants: `in_pool` implies `block_number == 0`; `native_coin` and
/// `smart_contract` are mutually exclusive; `confirmed` implies
/// `confirmations` has reached the chain's minimum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferRecord {
    #[serde(rename = "txId")]
    pub tx_id: String,
    pub timestamp: i64,
    #[serde(rename = "blockNum")]
    pub block_number: u64,
    pub success: bool,
    /// True when the classification pipeline recognized a value transfer.
    pub transfer: bool,
    #[serde(rename = "nativeCoin", default, skip_serializing_if = "std::ops::Not::not")]
    pub native_coin: bool,
    #[serde(rename = "smartContract", default, skip_serializing_if = "std::ops::Not::not")]
    pub smart_contract: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub symbol: String,
    pub from: String,
    /// Recipient address. For token transfers this is the decoded ABI
    /// recipient, not the contract address.
    pub to: String,
    pub amount: U256,
    pub fee: U256,
    #[serde(rename = "token", default, skip_serializing_if = "String::is_empty")]
    pub token_name: String,
    #[serde(rename = "tokenSymbol", default, skip_serializing_if = "String::is_empty")]
    pub token_symbol: String,
    pub decimals: u32,
    #[serde(rename = "inPool")]
    pub in_pool: bool,
    pub confirmed: bool,
    pub confirmations: u64,
    /// Opaque chain-specific payload, interpreted only by the owning
    /// chain adapter.
    #[serde(rename = "chainSpecificData", default, skip_serializing_if = "Option::is_none")]
    pub chain_data: Option<Vec<u8>>,
}

impl TransferRecord {
    /// Field-wise equality that deliberately skips the timestamp: mempool
    /// observations carry a local clock reading, not a chain one, so two
    /// sightings of the same transaction must still compare equal.
    pub fn same_observation(&self, other: &TransferRecord) -> bool {
        self.tx_id == other.tx_id
            && self.block_number == other.block_number
            && self.success == other.success
            && self.transfer == other.transfer
            && self.native_coin == other.native_coin
            && self.smart_contract == other.smart_contract
            && self.symbol == other.symbol
            && self.from == other.from
            && self.to == other.to
            && self.amount == other.amount
            && self.token_name == other.token_name
            && self.token_symbol == other.token_symbol
            && self.fee == other.fee
            && self.in_pool == other.in_pool
    }
}

/// Summary of a canonical-chain block with its decoded transfers in block
/// order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockSummary {
    #[serde(rename = "blockID")]
    pub id: String,
    pub number: u64,
    #[serde(rename = "parentHash")]
    pub parent_hash: String,
    pub timestamp: i64,
    pub transactions: Vec<TransferRecord>,
}
