//! The JSON-RPC 2.0 request/response envelope.

use crate::errors::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSON_RPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Decode the params object into a typed request. Missing params act
    /// as an empty object so optional-only methods need no params field.
    pub fn parse_params<T: serde::de::DeserializeOwned>(&self) -> Result<T, ApiError> {
        let params = if self.params.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            self.params.clone()
        };
        serde_json::from_value(params).map_err(|_| ApiError::parse())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub id: Value,
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            id,
            jsonrpc: JSON_RPC_VERSION,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: ApiError) -> Self {
        Self {
            id,
            jsonrpc: JSON_RPC_VERSION,
            result: None,
            error: Some(JsonRpcError {
                code: error.code,
                message: error.message,
                data: error.data,
            }),
        }
    }
}
