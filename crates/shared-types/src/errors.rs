//! Error types shared across subsystems.

use thiserror::Error;

/// Errors surfaced by a chain client implementation.
///
/// Transient upstream failures are `Transport`/`Node`; they are swallowed
/// and retried inside the watch loop, and surfaced as server errors to
/// user-triggered RPC calls. Classification skips ("not a transfer") are
/// not errors at all — the decode pipeline returns `Ok(None)` for those.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// The request never produced a response (connect, timeout, I/O).
    #[error("transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error object.
    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    /// The node answered, but the payload did not decode.
    #[error("invalid node response: {0}")]
    InvalidResponse(String),

    #[error("transaction not found")]
    TransactionNotFound,

    #[error("unknown transaction")]
    UnknownTransaction,

    #[error("unknown token")]
    UnknownToken,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("nothing to transfer")]
    NothingToTransfer,

    #[error("address and private key mismatch")]
    AddressKeyMismatch,

    /// Token-transfer submission is not wired up yet; callers receive
    /// this as a structured server error.
    #[error("token transfers not yet supported")]
    TokenTransfers,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction sign error")]
    SignError,
}

/// Errors from address byte/string conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid address string")]
    InvalidAddress,

    #[error("invalid address bytes")]
    InvalidAddressBytes,

    #[error("invalid private key")]
    InvalidPrivateKey,
}

/// Error from hex-quantity parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid hex quantity: {0}")]
pub struct HexError(pub String);
