//! The persisted address record.

use crate::errors::AddressError;
use serde::{Deserialize, Serialize};
use shared_types::AddressCodec;

/// One managed address.
///
/// A record without a private key is watch-only: it participates in
/// notifications but cannot sign. Keys are stored in the clear; the
/// payload shape leaves room for encrypting the key field later without a
/// schema change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: String,
    #[serde(rename = "addressBytes")]
    pub address_bytes: Vec<u8>,
    #[serde(rename = "privateKey", default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<Vec<u8>>,
    #[serde(default)]
    pub master: bool,

    #[serde(default)]
    pub subscribed: bool,
    #[serde(rename = "serviceId", default)]
    pub service_id: u64,
    #[serde(rename = "userId", default)]
    pub user_id: i64,
    #[serde(rename = "invoiceId", default)]
    pub invoice_id: i64,
    #[serde(rename = "watchOnly", default)]
    pub watch_only: bool,

    #[serde(rename = "bip39Mnemonic", default, skip_serializing_if = "Vec::is_empty")]
    pub mnemonic: Vec<String>,
}

impl AddressRecord {
    pub fn encode(&self) -> Result<Vec<u8>, AddressError> {
        serde_json::to_vec(self).map_err(|e| AddressError::Payload(e.to_string()))
    }

    pub fn decode(raw: &[u8]) -> Result<Self, AddressError> {
        serde_json::from_slice(raw).map_err(|e| AddressError::Payload(e.to_string()))
    }

    pub fn has_mnemonic(&self) -> bool {
        !self.mnemonic.is_empty()
    }

    /// Record invariants: non-empty identifiers, a key for every
    /// non-watch-only record, and the key deriving byte-for-byte to the
    /// record's address.
    pub fn validate(&self, codec: &dyn AddressCodec) -> Result<(), AddressError> {
        if self.address.is_empty() || self.address_bytes.is_empty() {
            return Err(AddressError::AddressEmpty);
        }
        match &self.private_key {
            None => {
                if !self.watch_only {
                    return Err(AddressError::PrivateKeyEmpty);
                }
            }
            Some(key) => {
                let (_, derived) = codec.address_from_key(key)?;
                if derived.as_slice() != self.address_bytes.as_slice() {
                    return Err(AddressError::KeyMismatch);
                }
            }
        }
        Ok(())
    }
}
