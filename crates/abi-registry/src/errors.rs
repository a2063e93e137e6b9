//! ABI error types.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AbiError {
    #[error("unknown method")]
    UnknownMethod,

    #[error("method params count mismatch")]
    ParamCountMismatch,

    #[error("method param type mismatch at index {0}")]
    ParamTypeMismatch(usize),

    /// Call-data shorter than `4 + 32 * param_count`.
    #[error("invalid params data")]
    InvalidParamsData,

    #[error("not a transfer method")]
    NotTransfer,

    #[error("unknown contract")]
    UnknownContract,

    #[error("registry payload: {0}")]
    Payload(String),
}
