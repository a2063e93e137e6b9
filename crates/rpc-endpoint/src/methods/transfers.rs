//! Transfer submission, fee estimation and transfer queries.

use crate::amount::{format_amount, parse_amount};
use crate::envelope::JsonRpcRequest;
use crate::errors::ApiError;
use crate::state::{ApiState, RequestContext};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::hexnum::parse_hex_bytes;
use shared_types::{ChainInfo, ChainReader, ChainTransfers, TransferRecord};
use tracing::{debug, error};

fn token_decimals(state: &ApiState, symbol: &str) -> Option<u32> {
    if symbol.eq_ignore_ascii_case(state.client.chain_symbol()) {
        return Some(state.client.decimals());
    }
    state
        .client
        .tokens()
        .iter()
        .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
        .map(|t| t.decimals)
}

fn parse_request_amount(
    state: &ApiState,
    amount: &Value,
    symbol: &str,
    formatted: bool,
) -> Result<(U256, u32), ApiError> {
    let decimals =
        token_decimals(state, symbol).ok_or_else(|| ApiError::validation("unknown asset symbol"))?;
    let text = match amount {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Err(ApiError::validation("invalid amount")),
    };
    let value = if formatted {
        parse_amount(&text, decimals)?
    } else {
        U256::from_dec_str(text.trim()).map_err(|_| ApiError::validation("invalid amount"))?
    };
    Ok((value, decimals))
}

#[derive(Debug, Default, Serialize)]
struct TransferAssetsResult {
    #[serde(rename = "tx_id")]
    tx_id: String,
    success: bool,
    #[serde(rename = "nativeCoin", skip_serializing_if = "std::ops::Not::not")]
    native_coin: bool,
    #[serde(rename = "smartContract", skip_serializing_if = "std::ops::Not::not")]
    smart_contract: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    symbol: String,
    from: String,
    to: String,
    amount: String,
    fee: String,
    #[serde(rename = "feeSymbol", skip_serializing_if = "String::is_empty")]
    fee_symbol: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    warning: String,
}

pub async fn transfer_assets(
    state: &ApiState,
    ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(rename = "serviceId", default)]
        service_id: u64,
        #[serde(rename = "privateKey", default)]
        private_key: String,
        #[serde(default)]
        from: String,
        #[serde(default)]
        to: String,
        #[serde(default)]
        amount: Value,
        #[serde(default)]
        symbol: String,
        #[serde(default)]
        force: bool,
        #[serde(default)]
        signature: String,
        #[serde(rename = "amountFormated", default)]
        amount_formatted: bool,
    }
    let mut params: Params = request.parse_params()?;
    // The request-signature field is reserved until its verification
    // policy is defined.
    if !params.signature.is_empty() {
        return Err(ApiError::validation("signature field is reserved"));
    }
    params.from = state.normalize_address(&params.from)?;
    params.to = state.normalize_address(&params.to)?;
    if params.symbol.is_empty() {
        return Err(ApiError::validation("asset symbol required"));
    }
    if params.to.is_empty() {
        return Err(ApiError::validation("to address required"));
    }
    if debug_on(state) {
        debug!(from = %params.from, to = %params.to, symbol = %params.symbol, "transfer assets request");
    }

    let (amount, decimals) =
        parse_request_amount(state, &params.amount, &params.symbol, params.amount_formatted)?;
    if amount.is_zero() {
        return Err(ApiError::validation("invalid amount"));
    }

    // Resolve the signing key: explicit, or owned by the service.
    let private_key: Vec<u8> = if !params.private_key.is_empty() {
        let key = parse_hex_bytes(&params.private_key)
            .map_err(|_| ApiError::validation("invalid private key"))?;
        let (derived, _) = state
            .codec()
            .address_from_key(&key)
            .map_err(|_| ApiError::validation("invalid private key"))?;
        if !params.from.is_empty() && !derived.eq_ignore_ascii_case(&params.from) {
            return Err(ApiError::validation("from address and key mismatch"));
        }
        params.from = derived;
        key
    } else if params.from.is_empty() {
        return Err(ApiError::validation("from address or private key required"));
    } else {
        let record = state
            .addresses
            .get(&params.from)
            .map_err(|_| ApiError::validation("private key required"))?;
        if record.service_id != params.service_id {
            return Err(ApiError::validation("address unknown or not owned by service"));
        }
        let subscription = state.external_subscription(params.service_id)?;
        ctx.ensure_authorized(&subscription)?;
        if record.watch_only && !params.force {
            return Err(ApiError::validation("address is watch only"));
        }
        record
            .private_key
            .ok_or_else(|| ApiError::validation("address is watch only"))?
    };

    let native = params.symbol.eq_ignore_ascii_case(state.client.chain_symbol());
    let tx_id = if native {
        state
            .client
            .transfer_by_key(&private_key, &params.from, &params.to, amount)
            .await?
    } else {
        state
            .client
            .token_transfer_by_key(&private_key, &params.from, &params.to, amount, &params.symbol)
            .await?
    };

    let format = |value: U256| {
        if params.amount_formatted {
            format_amount(value, decimals)
        } else {
            value.to_string()
        }
    };

    let result = match state.client.transfer_by_hash(&tx_id).await {
        Ok(info) => TransferAssetsResult {
            tx_id: info.tx_id,
            success: info.success,
            native_coin: info.native_coin,
            smart_contract: info.smart_contract,
            symbol: params.symbol.clone(),
            from: info.from,
            to: info.to,
            amount: format(amount),
            fee: format(info.fee),
            fee_symbol: if info.smart_contract {
                state.client.chain_symbol().to_string()
            } else {
                String::new()
            },
            warning: String::new(),
        },
        Err(e) => {
            error!(tx = %tx_id, error = %e, "can not load transfer info after submit");
            TransferAssetsResult {
                tx_id,
                success: false,
                symbol: params.symbol.clone(),
                from: params.from,
                to: params.to,
                amount: format(amount),
                fee: String::new(),
                warning: "Can not get transfer info by hash".into(),
                ..Default::default()
            }
        }
    };
    serde_json::to_value(result).map_err(|e| ApiError::server(e.to_string()))
}

pub async fn estimated_fee(
    state: &ApiState,
    _ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(default)]
        from: String,
        #[serde(default)]
        to: String,
        #[serde(default)]
        amount: Value,
        #[serde(default)]
        symbol: String,
        #[serde(rename = "amountFormated", default)]
        amount_formatted: bool,
    }
    let mut params: Params = request.parse_params()?;
    params.from = state.normalize_address(&params.from)?;
    params.to = state.normalize_address(&params.to)?;
    let (amount, decimals) =
        parse_request_amount(state, &params.amount, &params.symbol, params.amount_formatted)?;

    let native = params.symbol.eq_ignore_ascii_case(state.client.chain_symbol());
    let fee = if native {
        state
            .client
            .estimated_fee(&params.from, &params.to, amount)
            .await?
    } else {
        state
            .client
            .token_estimated_fee(&params.from, &params.to, amount, &params.symbol)
            .await?
    };
    let rendered = if params.amount_formatted {
        format_amount(fee, decimals)
    } else {
        fee.to_string()
    };
    Ok(Value::String(rendered))
}

#[derive(Debug, Serialize)]
struct TransferInfoResponse {
    #[serde(rename = "tx_id")]
    tx_id: String,
    timestamp: i64,
    #[serde(rename = "blockNum")]
    block_number: u64,
    success: bool,
    transfer: bool,
    #[serde(rename = "nativeCoin", skip_serializing_if = "std::ops::Not::not")]
    native_coin: bool,
    #[serde(rename = "smartContract", skip_serializing_if = "std::ops::Not::not")]
    smart_contract: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    symbol: String,
    decimals: u32,
    from: String,
    to: String,
    amount: String,
    #[serde(rename = "token", skip_serializing_if = "String::is_empty")]
    token_name: String,
    #[serde(rename = "tokenSymbol", skip_serializing_if = "String::is_empty")]
    token_symbol: String,
    fee: String,
    #[serde(rename = "inPool")]
    in_pool: bool,
    confirmed: bool,
    #[serde(skip_serializing_if = "is_zero_u64")]
    confirmations: u64,
}

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

impl TransferInfoResponse {
    fn from_record(record: &TransferRecord, formatted: bool) -> Self {
        let render = |value: U256| {
            if formatted {
                format_amount(value, record.decimals)
            } else {
                value.to_string()
            }
        };
        Self {
            tx_id: record.tx_id.clone(),
            timestamp: record.timestamp,
            block_number: record.block_number,
            success: record.success,
            transfer: record.transfer,
            native_coin: record.native_coin,
            smart_contract: record.smart_contract,
            symbol: record.symbol.clone(),
            decimals: record.decimals,
            from: record.from.clone(),
            to: record.to.clone(),
            amount: render(record.amount),
            token_name: record.token_name.clone(),
            token_symbol: record.token_symbol.clone(),
            fee: render(record.fee),
            in_pool: record.in_pool,
            confirmed: record.confirmed,
            confirmations: record.confirmations,
        }
    }
}

pub async fn transfer_info(
    state: &ApiState,
    _ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(rename = "txId", default)]
        tx_id: String,
        #[serde(rename = "amountsFormatted", default = "default_true")]
        amounts_formatted: bool,
    }
    let params: Params = request.parse_params()?;
    let record = state.cache.transfer_info(&params.tx_id).await.map_err(|e| {
        if debug_on(state) {
            debug!(tx = %params.tx_id, error = %e, "transfer info miss");
        }
        ApiError::server("unknown or unsupported transaction")
    })?;
    serde_json::to_value(TransferInfoResponse::from_record(
        &record,
        params.amounts_formatted,
    ))
    .map_err(|e| ApiError::server(e.to_string()))
}

pub async fn transfers_for_address(
    state: &ApiState,
    _ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(default)]
        address: String,
        #[serde(rename = "amountsFormatted", default = "default_true")]
        amounts_formatted: bool,
    }
    let params: Params = request.parse_params()?;
    let address = state.normalize_address(&params.address)?;
    let records = state.cache.transfers_for_address(&address).await?;
    let rows: Vec<TransferInfoResponse> = records
        .iter()
        .map(|record| TransferInfoResponse::from_record(record, params.amounts_formatted))
        .collect();
    serde_json::to_value(rows).map_err(|e| ApiError::server(e.to_string()))
}

fn default_true() -> bool {
    true
}

fn debug_on(state: &ApiState) -> bool {
    state.debug
}
