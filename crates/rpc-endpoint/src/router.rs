//! Method routing.

use crate::envelope::{JsonRpcRequest, JsonRpcResponse};
use crate::errors::ApiError;
use crate::methods;
use crate::state::{ApiState, RequestContext};
use serde_json::Value;
use tracing::{debug, warn};

/// Dispatch one decoded request. Both dotted and camelCase method names
/// resolve to the same handler.
pub async fn route_method(
    state: &ApiState,
    ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    if state.debug {
        debug!(method = %request.method, remote = %ctx.remote_addr, "processing rpc request");
    }
    match request.method.as_str() {
        "ping" => methods::info::ping(state, ctx, request).await,
        "info" | "getNodeInfo" => methods::info::node_info(state, ctx, request).await,
        "info.get.token.list" | "infoGetTokenList" => {
            methods::info::token_list(state, ctx, request).await
        }

        "address.get.new" | "addressGetNew" => {
            methods::address::get_new(state, ctx, request).await
        }
        "address.subscribe" | "addressSubscribe" => {
            methods::address::subscribe(state, ctx, request).await
        }
        "address.recover" | "addressRecover" => {
            methods::address::recover(state, ctx, request).await
        }
        "address.generate" | "addressGenerate" => {
            methods::address::generate(state, ctx, request).await
        }
        "address.balance" | "addressGetBalance" => {
            methods::balance::get_balance(state, ctx, request).await
        }

        "service.register" | "serviceRegister" => {
            methods::service::register(state, ctx, request).await
        }
        "service.config" | "serviceConfig" => {
            methods::service::configure(state, ctx, request).await
        }

        "transfer.assets" | "transferAssets" => {
            methods::transfers::transfer_assets(state, ctx, request).await
        }
        "transfer.get.estimated.fee" | "transferGetEstimatedFee" => {
            methods::transfers::estimated_fee(state, ctx, request).await
        }
        "transfer.info" | "transferInfo" => {
            methods::transfers::transfer_info(state, ctx, request).await
        }
        "transfer.info.for.address" | "transferInfoForAddress" => {
            methods::transfers::transfers_for_address(state, ctx, request).await
        }

        unknown => {
            warn!(method = unknown, "unknown rpc method");
            Err(ApiError::method_not_found())
        }
    }
}

/// Parse the body and produce the response envelope.
pub async fn process_request(state: &ApiState, ctx: &RequestContext, body: &str) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_str(body) {
        Ok(request) => request,
        Err(_) => return JsonRpcResponse::error(Value::Null, ApiError::parse()),
    };
    if request.method.is_empty() {
        return JsonRpcResponse::error(
            request.id,
            ApiError::validation(crate::errors::ERROR_MESSAGE_INVALID_REQUEST),
        );
    }
    let id = request.id.clone();
    match route_method(state, ctx, &request).await {
        Ok(result) => JsonRpcResponse::result(id, result),
        Err(error) => JsonRpcResponse::error(id, error),
    }
}
