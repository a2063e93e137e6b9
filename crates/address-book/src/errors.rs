//! Address book error types.

use shared_types::CodecError;
use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("unknown address")]
    Unknown,

    #[error("address already exists")]
    Exists,

    #[error("no free addresses")]
    NoFreeAddresses,

    #[error("address string empty")]
    AddressEmpty,

    #[error("private key empty")]
    PrivateKeyEmpty,

    #[error("address and private key mismatch")]
    KeyMismatch,

    #[error("invalid mnemonic length, expected 12 or 24 words")]
    InvalidMnemonicLength,

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("record payload: {0}")]
    Payload(String),
}
