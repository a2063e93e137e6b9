//! Watcher error types.

use storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("state payload: {0}")]
    Payload(String),
}
