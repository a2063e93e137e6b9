//! Webhook notification payloads and delivery.
//!
//! Deliveries are JSON-RPC 2.0 POSTs (`blockEvent` / `transactionEvent`)
//! to the subscription's event URL. A delivery runs on its own task, its
//! result is logged, and it is never retried here.

use crate::ledger::LedgerRecord;
use crate::subscription::Subscription;
use chain_client::RpcRequest;
use primitive_types::U256;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

fn u256_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

/// Payload of a `transactionEvent` webhook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransferNotification {
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(rename = "tx_id")]
    pub tx_id: String,
    pub timestamp: i64,
    #[serde(rename = "blockNum")]
    pub block_number: u64,
    pub success: bool,
    pub transfer: bool,
    #[serde(rename = "nativeCoin", skip_serializing_if = "std::ops::Not::not")]
    pub native_coin: bool,
    #[serde(rename = "smartContract", skip_serializing_if = "std::ops::Not::not")]
    pub smart_contract: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub symbol: String,
    pub from: String,
    pub to: String,
    #[serde(serialize_with = "u256_decimal")]
    pub amount: U256,
    #[serde(rename = "token", skip_serializing_if = "String::is_empty")]
    pub token_name: String,
    #[serde(rename = "tokenSymbol", skip_serializing_if = "String::is_empty")]
    pub token_symbol: String,
    #[serde(serialize_with = "u256_decimal")]
    pub fee: U256,
    #[serde(rename = "inPool")]
    pub in_pool: bool,
    pub confirmed: bool,
    pub confirmations: u64,
    #[serde(rename = "userId", skip_serializing_if = "is_zero_i64")]
    pub user_id: i64,
    #[serde(rename = "invoiceId", skip_serializing_if = "is_zero_i64")]
    pub invoice_id: i64,
    #[serde(rename = "sign", skip_serializing_if = "String::is_empty")]
    pub signature: String,
}

impl TransferNotification {
    pub fn from_record(record: &LedgerRecord) -> Self {
        let t = &record.transfer;
        Self {
            chain_id: String::new(),
            tx_id: t.tx_id.clone(),
            timestamp: t.timestamp,
            block_number: t.block_number,
            success: t.success,
            transfer: t.transfer,
            native_coin: t.native_coin,
            smart_contract: t.smart_contract,
            symbol: t.symbol.clone(),
            from: t.from.clone(),
            to: t.to.clone(),
            amount: t.amount,
            token_name: t.token_name.clone(),
            token_symbol: t.token_symbol.clone(),
            fee: t.fee,
            in_pool: t.in_pool,
            confirmed: t.confirmed,
            confirmations: t.confirmations,
            user_id: 0,
            invoice_id: 0,
            signature: String::new(),
        }
    }

    /// SHA-256 over the colon-joined body fields plus the service's api
    /// key, so receivers can check payload integrity.
    pub fn sign(&mut self, api_key: &str) {
        let body = [
            self.tx_id.clone(),
            self.timestamp.to_string(),
            self.block_number.to_string(),
            self.success.to_string(),
            self.native_coin.to_string(),
            self.symbol.clone(),
            self.from.clone(),
            self.to.clone(),
            self.amount.to_string(),
            self.token_name.clone(),
            self.token_symbol.clone(),
            self.fee.to_string(),
            self.in_pool.to_string(),
            self.confirmed.to_string(),
            self.confirmations.to_string(),
            api_key.to_string(),
        ]
        .join(":");
        let digest = Sha256::digest(body.as_bytes());
        self.signature = hex::encode(digest);
    }
}

/// Payload of a `blockEvent` webhook.
#[derive(Debug, Clone, Serialize)]
pub struct BlockNotification {
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(rename = "blockNum")]
    pub block_number: u64,
    #[serde(rename = "blockId")]
    pub block_id: String,
}

/// Shared HTTP sender for webhook deliveries.
#[derive(Clone, Default)]
pub struct Notifier {
    http: reqwest::Client,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one notification. Internal subscriptions (and those with no
    /// URL) log instead of sending.
    pub async fn send(
        &self,
        subscription: &Subscription,
        method: &str,
        payload: &impl Serialize,
        debug_mode: bool,
    ) {
        if subscription.internal || subscription.event_url.is_empty() {
            debug!(method, service = subscription.service_id, "internal notification");
            if debug_mode {
                if let Ok(body) = serde_json::to_string(payload) {
                    debug!(%body, "notification payload");
                }
            }
            return;
        }
        let request = match RpcRequest::with_object(method, payload) {
            Ok(request) => request,
            Err(e) => {
                warn!(method, error = %e, "can not encode notification");
                return;
            }
        };
        match self
            .http
            .post(&subscription.event_url)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => {
                debug!(
                    method,
                    service = subscription.service_id,
                    status = %response.status(),
                    "notification delivered"
                );
            }
            Err(e) => {
                warn!(
                    method,
                    service = subscription.service_id,
                    error = %e,
                    "can not send service notification"
                );
            }
        }
    }
}
