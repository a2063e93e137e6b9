//! `ping`, `info` and the token table.

use crate::envelope::JsonRpcRequest;
use crate::errors::ApiError;
use crate::state::{ApiState, RequestContext};
use serde::Serialize;
use serde_json::{json, Value};
use shared_types::{ChainInfo, TokenInfo};
use std::time::{SystemTime, UNIX_EPOCH};

pub async fn ping(
    _state: &ApiState,
    _ctx: &RequestContext,
    _request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);
    Ok(json!({ "result": "pong", "timestamp": timestamp }))
}

pub async fn node_info(
    state: &ApiState,
    _ctx: &RequestContext,
    _request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Serialize)]
    struct NodeInfo {
        blockchain: String,
        id: String,
        symbol: String,
        decimals: u32,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        protocols: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        tokens: Vec<TokenInfo>,
    }
    let info = NodeInfo {
        blockchain: state.client.chain_name().to_string(),
        id: state.client.chain_id().to_string(),
        symbol: state.client.chain_symbol().to_string(),
        decimals: state.client.decimals(),
        protocols: state.client.token_protocols(),
        tokens: state.client.tokens(),
    };
    serde_json::to_value(info).map_err(|e| ApiError::server(e.to_string()))
}

pub async fn token_list(
    state: &ApiState,
    _ctx: &RequestContext,
    _request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Serialize)]
    struct TokenRow {
        name: String,
        symbol: String,
        decimals: u32,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        token: bool,
        #[serde(rename = "contractAddress")]
        contract_address: String,
    }
    let mut rows = vec![TokenRow {
        name: state.client.chain_name().to_string(),
        symbol: state.client.chain_symbol().to_string(),
        decimals: state.client.decimals(),
        token: false,
        contract_address: String::new(),
    }];
    for token in state.client.tokens() {
        rows.push(TokenRow {
            name: token.name,
            symbol: token.symbol,
            decimals: token.decimals,
            token: true,
            contract_address: token.contract_address,
        });
    }
    serde_json::to_value(rows).map_err(|e| ApiError::server(e.to_string()))
}
