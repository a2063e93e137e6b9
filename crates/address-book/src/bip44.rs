//! Mnemonic-backed address records.

use crate::errors::AddressError;
use crate::record::AddressRecord;
use shared_crypto::{mnemonic, CryptoError};
use shared_types::AddressCodec;

fn record_from_key(
    key: shared_crypto::MnemonicKey,
    codec: &dyn AddressCodec,
) -> Result<AddressRecord, AddressError> {
    let (address, address_bytes) = codec.address_from_key(&key.private_key)?;
    Ok(AddressRecord {
        address,
        address_bytes: address_bytes.to_vec(),
        private_key: Some(key.private_key.to_vec()),
        mnemonic: key.words,
        ..Default::default()
    })
}

/// Generate a fresh record with a 12- or 24-word mnemonic.
pub fn generate(word_count: usize, codec: &dyn AddressCodec) -> Result<AddressRecord, AddressError> {
    let key = mnemonic::generate(word_count).map_err(|e| match e {
        CryptoError::InvalidMnemonicLength => AddressError::InvalidMnemonicLength,
        other => AddressError::InvalidMnemonic(other.to_string()),
    })?;
    record_from_key(key, codec)
}

/// Recover the record belonging to an existing word list.
pub fn recover(words: &[String], codec: &dyn AddressCodec) -> Result<AddressRecord, AddressError> {
    let key =
        mnemonic::recover(words).map_err(|e| AddressError::InvalidMnemonic(e.to_string()))?;
    record_from_key(key, codec)
}
