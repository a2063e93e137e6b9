//! Downstream API behavior over the mock chain.

use adapter_tests::{cache_fixture, native_transfer, reporting_service, Harness};
use primitive_types::U256;
use rpc_endpoint::router::process_request;
use rpc_endpoint::state::{ApiState, RequestContext};
use serde_json::{json, Value};
use shared_bus::{EventListener, TransactionEvent};
use shared_types::ChainClient;
use std::sync::Arc;

struct Api {
    h: Harness,
    state: ApiState,
    _cache_dir: tempfile::TempDir,
    cache: Arc<tx_cache::TxCacheManager>,
}

fn api() -> Api {
    let h = Harness::new(3);
    let (cache_dir, cache, _cache_loop) = cache_fixture();
    let chain: Arc<dyn ChainClient> = h.chain.clone();
    let state = ApiState {
        client: chain,
        addresses: h.addresses.clone(),
        subscriptions: h.manager.clone(),
        cache: cache.clone(),
        debug: false,
    };
    Api {
        h,
        state,
        _cache_dir: cache_dir,
        cache,
    }
}

async fn call(state: &ApiState, ctx: &RequestContext, body: Value) -> Value {
    let response = process_request(state, ctx, &body.to_string()).await;
    serde_json::to_value(&response).unwrap()
}

#[tokio::test]
async fn ping_answers_pong() {
    let api = api();
    let ctx = RequestContext::default();
    let response = call(
        &api.state,
        &ctx,
        json!({"id": 1, "jsonrpc": "2.0", "method": "ping"}),
    )
    .await;
    assert_eq!(response["result"]["result"], "pong");
    assert!(response["result"]["timestamp"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn unknown_method_and_parse_errors() {
    let api = api();
    let ctx = RequestContext::default();
    let response = call(
        &api.state,
        &ctx,
        json!({"id": 1, "method": "definitely.not.a.method"}),
    )
    .await;
    assert_eq!(response["error"]["code"], -32601);

    let response = process_request(&api.state, &ctx, "{not json").await;
    let response = serde_json::to_value(&response).unwrap();
    assert_eq!(response["error"]["code"], -32700);
}

#[tokio::test]
async fn dotted_and_camel_forms_are_equivalent() {
    let api = api();
    let ctx = RequestContext::default();
    for method in ["info.get.token.list", "infoGetTokenList"] {
        let response = call(&api.state, &ctx, json!({"id": 1, "method": method})).await;
        let rows = response["result"].as_array().unwrap();
        assert_eq!(rows[0]["symbol"], "MOCK");
        assert_eq!(rows[1]["symbol"], "USDT");
    }
}

#[tokio::test]
async fn address_get_new_requires_the_service_token() {
    let api = api();
    let mut service = reporting_service(5);
    service.api_token = "sesame".into();
    api.h.add_service(service);
    // One free pool address.
    api.h
        .addresses
        .insert_with("0x4545454545454545454545454545454545454545", |r| {
            r.watch_only = true;
        })
        .unwrap();

    let request = json!({
        "id": 1,
        "method": "addressGetNew",
        "params": {"serviceId": 5, "userId": 7, "invoiceId": 9}
    });
    // Missing token.
    let denied = call(&api.state, &RequestContext::default(), request.clone()).await;
    assert_eq!(denied["error"]["code"], -32001);

    // Correct token.
    let ctx = RequestContext {
        api_token: Some("sesame".into()),
        ..Default::default()
    };
    let granted = call(&api.state, &ctx, request).await;
    assert_eq!(granted["result"]["success"], true);
    let address = granted["result"]["address"].as_str().unwrap();
    assert!(api.h.addresses.get(address).unwrap().subscribed);
}

#[tokio::test]
async fn address_subscribe_validates_material() {
    let api = api();
    api.h.add_service(reporting_service(5));
    let ctx = RequestContext::default();

    // Key and address that do not match.
    let response = call(
        &api.state,
        &ctx,
        json!({
            "id": 1,
            "method": "addressSubscribe",
            "params": {
                "serviceId": 5,
                "address": "0x3535353535353535353535353535353535353535",
                "privateKey": "0x4646464646464646464646464646464646464646464646464646464646464646"
            }
        }),
    )
    .await;
    assert_eq!(response["error"]["code"], -32600);

    // Watch-only subscribe by bare address works.
    let response = call(
        &api.state,
        &ctx,
        json!({
            "id": 1,
            "method": "address.subscribe",
            "params": {
                "serviceId": 5,
                "address": "0x3535353535353535353535353535353535353535",
                "userId": 3
            }
        }),
    )
    .await;
    assert_eq!(response["result"]["success"], true);
    assert!(api
        .h
        .addresses
        .is_known("0x3535353535353535353535353535353535353535"));
}

#[tokio::test]
async fn service_config_rejects_reserved_signature() {
    let api = api();
    api.h.add_service(reporting_service(5));
    let response = call(
        &api.state,
        &RequestContext::default(),
        json!({
            "id": 1,
            "method": "serviceConfig",
            "params": {
                "serviceId": 5,
                "eventUrl": "http://svc.example/hook",
                "signature": "deadbeef"
            }
        }),
    )
    .await;
    assert_eq!(response["error"]["code"], -32600);
}

#[tokio::test]
async fn service_config_echoes_without_token() {
    let api = api();
    api.h.add_service(reporting_service(5));
    let response = call(
        &api.state,
        &RequestContext::default(),
        json!({
            "id": 1,
            "method": "service.config",
            "params": {
                "serviceId": 5,
                "apiToken": "secret-stays-out",
                "eventUrl": "http://svc.example/hook2",
                "reportNewBlock": true,
                "reportIncomingTx": true,
                "reportTokens": ["USDT"],
                "gatherToMaster": true,
                "masterList": ["0x1212121212121212121212121212121212121212"]
            }
        }),
    )
    .await;
    assert_eq!(response["result"]["eventUrl"], "http://svc.example/hook2");
    assert!(response["result"].get("apiToken").is_none());

    let updated = api.h.manager.subscriptions().get(5).unwrap();
    assert!(updated.report_new_block);
    assert!(updated.reports_token("USDT"));
    assert!(updated.gather_to_master);
}

#[tokio::test]
async fn balances_and_transfer_info_round_trip() {
    let api = api();
    let address = "0x3535353535353535353535353535353535353535";
    api.h.chain.set_balance(address, U256::from(1_500_000_000_000_000_000u64));

    let response = call(
        &api.state,
        &RequestContext::default(),
        json!({
            "id": 1,
            "method": "addressGetBalance",
            "params": {"address": address, "allAssets": false, "formatted": true}
        }),
    )
    .await;
    assert_eq!(response["result"]["MOCK"], "1.500000000000000000");

    // Seed the cache through the listener path, then query.
    api.cache.on_transaction(&TransactionEvent {
        transfer: native_transfer("0x30", address, 42, 9, false),
    });
    api.cache.drain().await;
    let response = call(
        &api.state,
        &RequestContext::default(),
        json!({
            "id": 1,
            "method": "transferInfo",
            "params": {"txId": "0x30", "amountsFormatted": false}
        }),
    )
    .await;
    assert_eq!(response["result"]["amount"], "42");
    assert_eq!(response["result"]["blockNum"], 9);

    let response = call(
        &api.state,
        &RequestContext::default(),
        json!({
            "id": 1,
            "method": "transferInfoForAddress",
            "params": {"address": address}
        }),
    )
    .await;
    assert_eq!(response["result"].as_array().unwrap().len(), 1);

    // Token transfers surface the structured server error.
    let response = call(
        &api.state,
        &RequestContext::default(),
        json!({
            "id": 1,
            "method": "transferGetEstimatedFee",
            "params": {"from": address, "to": address, "amount": "1", "symbol": "USDT"}
        }),
    )
    .await;
    assert_eq!(response["error"]["code"], -32000);
}
