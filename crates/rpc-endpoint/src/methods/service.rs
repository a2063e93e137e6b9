//! Service registration and delivery configuration.

use crate::envelope::JsonRpcRequest;
use crate::errors::ApiError;
use crate::state::{ApiState, RequestContext};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::ChainInfo;
use std::collections::HashMap;
use subscriptions::Subscription;

pub async fn register(
    state: &ApiState,
    _ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(rename = "serviceId", default)]
        service_id: u64,
        #[serde(rename = "serviceName", default)]
        service_name: String,
        #[serde(rename = "eventUrl", default)]
        event_url: String,
        #[serde(rename = "apiToken", default)]
        api_token: String,
        #[serde(rename = "apiKey", default)]
        api_key: String,
    }
    let params: Params = request.parse_params()?;
    if params.service_id == 0 {
        return Err(ApiError::validation("Invalid service id"));
    }
    if state
        .subscriptions
        .subscriptions()
        .get(params.service_id)
        .is_ok()
    {
        return Err(ApiError::validation("serviceId already registered"));
    }
    let subscription = Subscription {
        service_id: params.service_id,
        service_name: params.service_name,
        event_url: params.event_url,
        api_token: params.api_token,
        api_key: params.api_key,
        report_main_coin: true,
        ..Default::default()
    };
    state
        .subscriptions
        .subscriptions()
        .insert(subscription)
        .map_err(|e| ApiError::validation(e.to_string()))?;
    Ok(serde_json::json!({ "success": true }))
}

pub async fn configure(
    state: &ApiState,
    ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize, Serialize)]
    struct Params {
        #[serde(rename = "serviceId")]
        service_id: u64,
        #[serde(rename = "apiToken", default, skip_serializing)]
        api_token: String,
        #[serde(rename = "eventUrl", default)]
        event_url: String,
        #[serde(rename = "reportNewBlock", default)]
        report_new_block: bool,
        #[serde(rename = "reportIncomingTx", default)]
        report_incoming_tx: bool,
        #[serde(rename = "reportOutgoingTx", default)]
        report_outgoing_tx: bool,
        #[serde(rename = "reportMainCoin", default = "default_true")]
        report_main_coin: bool,
        #[serde(rename = "reportTokens", default)]
        report_tokens: Vec<String>,
        #[serde(rename = "gatherToMaster", default)]
        gather_to_master: bool,
        #[serde(rename = "masterList", default)]
        master_list: Vec<String>,
        /// Reserved until the verification policy is defined; any
        /// non-empty value is rejected.
        #[serde(default, skip_serializing)]
        signature: String,
    }
    fn default_true() -> bool {
        true
    }

    let params: Params = request.parse_params()?;
    if !params.signature.is_empty() {
        return Err(ApiError::validation("signature field is reserved"));
    }
    let subscription = state.external_subscription(params.service_id)?;
    ctx.ensure_authorized(&subscription)?;

    // Master addresses must at least decode.
    let codec = state.codec();
    let mut master_list = Vec::with_capacity(params.master_list.len());
    for master in &params.master_list {
        master_list.push(
            codec
                .normalize(master)
                .map_err(|_| ApiError::validation("invalid master address"))?,
        );
    }

    let known_tokens = state.client.tokens();
    let mut report_tokens: HashMap<String, bool> = known_tokens
        .iter()
        .map(|t| (t.symbol.clone(), false))
        .collect();
    for symbol in &params.report_tokens {
        report_tokens.insert(symbol.clone(), true);
    }

    state
        .subscriptions
        .subscriptions()
        .edit(params.service_id, |subscription| {
            subscription.event_url = params.event_url.clone();
            subscription.report_new_block = params.report_new_block;
            subscription.report_incoming_tx = params.report_incoming_tx;
            subscription.report_outgoing_tx = params.report_outgoing_tx;
            subscription.report_main_coin = params.report_main_coin;
            subscription.report_tokens = report_tokens.clone();
            subscription.gather_to_master = params.gather_to_master;
            subscription.master_list = master_list.clone();
        })
        .map_err(|e| ApiError::validation(e.to_string()))?;

    // Echo the accepted configuration, token blanked.
    serde_json::to_value(&params).map_err(|e| ApiError::server(e.to_string()))
}
