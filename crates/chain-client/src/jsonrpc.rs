//! JSON-RPC 2.0 envelope shared by the upstream client and the webhook
//! sender.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::ChainError;

pub const JSON_RPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    /// A request with positional parameters (possibly none).
    pub fn new(method: &str) -> Self {
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            id: 1,
            method: method.to_string(),
            params: Value::Array(Vec::new()),
        }
    }

    pub fn param(mut self, value: impl Serialize) -> Self {
        if let Value::Array(params) = &mut self.params {
            if let Ok(value) = serde_json::to_value(value) {
                params.push(value);
            }
        }
        self
    }

    /// A request whose params are a single serialized object — the shape
    /// webhook notifications use.
    pub fn with_object(method: &str, body: &impl Serialize) -> Result<Self, ChainError> {
        let params =
            serde_json::to_value(body).map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        Ok(Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            id: 1,
            method: method.to_string(),
            params,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// The raw result, with a node error mapped to [`ChainError::Node`].
    /// A missing result decodes as JSON null.
    pub fn raw_result(self) -> Result<Value, ChainError> {
        if let Some(error) = self.error {
            return Err(ChainError::Node {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }

    /// Decode the result into a concrete type.
    pub fn into_result<T: serde::de::DeserializeOwned>(self) -> Result<T, ChainError> {
        let value = self.raw_result()?;
        serde_json::from_value(value).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }
}
