//! Cache error types.

use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxCacheError {
    #[error("unknown transaction")]
    UnknownTransaction,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("payload: {0}")]
    Payload(String),
}
