//! JSON-RPC error codes and the handler error type.

use shared_types::ChainError;
use thiserror::Error;

pub const ERROR_CODE_PARSE: i64 = -32700;
pub const ERROR_CODE_INVALID_REQUEST: i64 = -32600;
pub const ERROR_CODE_METHOD_NOT_FOUND: i64 = -32601;
pub const ERROR_CODE_SERVER: i64 = -32000;
pub const ERROR_CODE_UNAUTHORIZED: i64 = -32001;

pub const ERROR_MESSAGE_PARSE: &str = "Parse error";
pub const ERROR_MESSAGE_INVALID_REQUEST: &str = "invalid request";
pub const ERROR_MESSAGE_METHOD_NOT_FOUND: &str = "method not found";
pub const ERROR_MESSAGE_SERVER: &str = "server error";
pub const ERROR_MESSAGE_UNAUTHORIZED: &str = "unauthorized access";

/// A structured JSON-RPC error.
#[derive(Debug, Clone, Error)]
#[error("rpc error {code}: {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    pub data: Option<String>,
}

impl ApiError {
    pub fn parse() -> Self {
        Self {
            code: ERROR_CODE_PARSE,
            message: ERROR_MESSAGE_PARSE.into(),
            data: None,
        }
    }

    /// A caller mistake: bad address, wrong amount format, unknown token.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: ERROR_CODE_INVALID_REQUEST,
            message: message.into(),
            data: None,
        }
    }

    pub fn unauthorized(hint: impl Into<String>) -> Self {
        Self {
            code: ERROR_CODE_UNAUTHORIZED,
            message: ERROR_MESSAGE_UNAUTHORIZED.into(),
            data: Some(hint.into()),
        }
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self {
            code: ERROR_CODE_SERVER,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found() -> Self {
        Self {
            code: ERROR_CODE_METHOD_NOT_FOUND,
            message: ERROR_MESSAGE_METHOD_NOT_FOUND.into(),
            data: None,
        }
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidAddress(_)
            | ChainError::AddressKeyMismatch
            | ChainError::UnknownToken => ApiError::validation(err.to_string()),
            other => ApiError::server(other.to_string()),
        }
    }
}
