//! Crypto error types.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CryptoError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("signing failed")]
    SigningFailed,

    #[error("rlp decode error: {0}")]
    Rlp(String),

    #[error("invalid mnemonic length, expected 12 or 24 words")]
    InvalidMnemonicLength,

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed")]
    KeyDerivation,
}

impl From<rlp::DecoderError> for CryptoError {
    fn from(err: rlp::DecoderError) -> Self {
        CryptoError::Rlp(err.to_string())
    }
}
