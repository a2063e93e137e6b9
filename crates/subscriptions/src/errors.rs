//! Subscription engine error types.

use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("unknown serviceId")]
    UnknownService,

    #[error("unknown transaction")]
    UnknownTransaction,

    #[error("invalid event url: {0}")]
    InvalidEventUrl(String),

    #[error("gather enabled without a master list")]
    EmptyMasterList,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("payload: {0}")]
    Payload(String),
}
