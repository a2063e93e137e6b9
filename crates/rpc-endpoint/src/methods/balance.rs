//! `addressGetBalance`.

use crate::amount::format_amount;
use crate::envelope::JsonRpcRequest;
use crate::errors::ApiError;
use crate::state::{ApiState, RequestContext};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::{ChainBalances, ChainInfo, TokenInfo};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct Params {
    #[serde(default)]
    address: String,
    /// Comma-separated symbol list; overrides `allAssets`.
    #[serde(default)]
    assets: String,
    #[serde(rename = "allAssets", default = "default_true")]
    all_assets: bool,
    #[serde(default = "default_true")]
    formatted: bool,
    #[serde(default)]
    extended: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
struct ExtendedRow {
    symbol: String,
    amount: String,
    decimals: u32,
}

pub async fn get_balance(
    state: &ApiState,
    _ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    let mut params: Params = request.parse_params()?;
    if !state.codec().is_valid(&params.address) {
        return Err(ApiError::validation("Invalid address"));
    }
    if !params.assets.is_empty() {
        params.all_assets = false;
    }

    let chain_symbol = state.client.chain_symbol().to_string();
    let tokens: HashMap<String, TokenInfo> = state
        .client
        .tokens()
        .into_iter()
        .filter(|t| !t.symbol.is_empty())
        .map(|t| (t.symbol.to_uppercase(), t))
        .collect();

    let asset_list: Vec<String> = if params.all_assets {
        let mut assets = vec![chain_symbol.clone()];
        assets.extend(tokens.keys().cloned());
        assets
    } else if params.assets.is_empty() {
        vec![chain_symbol.clone()]
    } else {
        let requested: Vec<String> = params
            .assets
            .to_uppercase()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for asset in &requested {
            if *asset != chain_symbol.to_uppercase() && !tokens.contains_key(asset) {
                return Err(ApiError::validation(format!("Unknown asset: {asset}")));
            }
        }
        requested
    };

    debug!(address = %params.address, assets = asset_list.len(), "balance query");

    let mut plain = serde_json::Map::new();
    let mut extended = Vec::new();
    for asset in asset_list {
        let (balance, decimals): (U256, u32) =
            if asset.eq_ignore_ascii_case(&chain_symbol) {
                (
                    state.client.balance_of(&params.address).await?,
                    state.client.decimals(),
                )
            } else {
                let token = &tokens[&asset];
                (
                    state
                        .client
                        .token_balance_of(&params.address, &token.symbol)
                        .await?,
                    token.decimals,
                )
            };
        let rendered = if params.formatted {
            format_amount(balance, decimals)
        } else {
            balance.to_string()
        };
        if params.extended {
            extended.push(ExtendedRow {
                symbol: asset,
                amount: rendered,
                decimals,
            });
        } else {
            plain.insert(asset, Value::String(rendered));
        }
    }

    if params.extended {
        serde_json::to_value(extended).map_err(|e| ApiError::server(e.to_string()))
    } else {
        Ok(Value::Object(plain))
    }
}
