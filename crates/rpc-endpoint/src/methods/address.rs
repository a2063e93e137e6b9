//! Address lifecycle: getNew, subscribe, recover, generate.

use crate::envelope::JsonRpcRequest;
use crate::errors::ApiError;
use crate::state::{ApiState, RequestContext};
use address_book::{AddressError, AddressRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::hexnum::{bytes_to_hex, parse_hex_bytes};

#[derive(Debug, Serialize, Default)]
struct AddressResponse {
    success: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    address: String,
    #[serde(rename = "privateKey", skip_serializing_if = "String::is_empty")]
    private_key: String,
    #[serde(rename = "userId", skip_serializing_if = "is_zero")]
    user_id: i64,
    #[serde(rename = "invoiceId", skip_serializing_if = "is_zero")]
    invoice_id: i64,
    #[serde(rename = "watchOnly", skip_serializing_if = "std::ops::Not::not")]
    watch_only: bool,
    #[serde(rename = "bip39Mnemonic", skip_serializing_if = "Vec::is_empty")]
    mnemonic: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl AddressResponse {
    fn full(record: &AddressRecord) -> Self {
        Self {
            success: true,
            address: record.address.clone(),
            private_key: record
                .private_key
                .as_deref()
                .map(bytes_to_hex)
                .unwrap_or_default(),
            user_id: record.user_id,
            invoice_id: record.invoice_id,
            watch_only: record.watch_only,
            mnemonic: record.mnemonic.clone(),
            message: String::new(),
        }
    }
}

pub async fn get_new(
    state: &ApiState,
    ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(rename = "serviceId", default)]
        service_id: u64,
        #[serde(rename = "userId", default)]
        user_id: i64,
        #[serde(rename = "invoiceId", default)]
        invoice_id: i64,
        #[serde(rename = "watchOnly", default)]
        watch_only: bool,
        #[serde(rename = "fullInfo", default)]
        full_info: bool,
    }
    let params: Params = request.parse_params()?;
    if params.service_id == 0 {
        return Err(ApiError::validation("Invalid service id"));
    }
    let subscription = state.external_subscription(params.service_id)?;
    ctx.ensure_authorized(&subscription)?;

    let record = state
        .addresses
        .take_free_and_subscribe(
            params.service_id,
            params.user_id,
            params.invoice_id,
            params.watch_only,
        )
        .map_err(|e| ApiError::server(e.to_string()))?;

    let response = if params.full_info {
        AddressResponse::full(&record)
    } else {
        AddressResponse {
            success: true,
            address: record.address.clone(),
            ..Default::default()
        }
    };
    serde_json::to_value(response).map_err(|e| ApiError::server(e.to_string()))
}

pub async fn subscribe(
    state: &ApiState,
    ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(default)]
        address: String,
        #[serde(rename = "privateKey", default)]
        private_key: String,
        #[serde(default)]
        mnemonic: Vec<String>,
        #[serde(rename = "serviceId", default)]
        service_id: u64,
        #[serde(rename = "userId", default)]
        user_id: i64,
        #[serde(rename = "invoiceId", default)]
        invoice_id: i64,
        #[serde(rename = "watchOnly", default)]
        watch_only: bool,
    }
    let mut params: Params = request.parse_params()?;
    if params.service_id == 0 {
        return Err(ApiError::validation("Invalid service id"));
    }
    let subscription = state.external_subscription(params.service_id)?;
    ctx.ensure_authorized(&subscription)?;

    // Resolve the address from whichever material was supplied; the
    // pieces must agree when more than one is present.
    if !params.address.is_empty() {
        params.address = state.normalize_address(&params.address)?;
    }
    let mut private_key: Option<Vec<u8>> = None;
    if !params.private_key.is_empty() {
        let key = parse_hex_bytes(&params.private_key)
            .map_err(|_| ApiError::validation("Invalid private key"))?;
        let (derived, _) = state
            .codec()
            .address_from_key(&key)
            .map_err(|_| ApiError::validation("Invalid private key"))?;
        if !params.address.is_empty() && !derived.eq_ignore_ascii_case(&params.address) {
            return Err(ApiError::validation("Address and private key mismatch"));
        }
        params.address = derived;
        private_key = Some(key);
    }
    if !params.mnemonic.is_empty() {
        let recovered = state
            .addresses
            .recover_bip44(&params.mnemonic)
            .map_err(|_| ApiError::validation("Invalid mnemonic"))?;
        if !params.address.is_empty()
            && !recovered.address.eq_ignore_ascii_case(&params.address)
        {
            return Err(ApiError::validation("Address and mnemonic mismatch"));
        }
        if let Some(key) = &private_key {
            if recovered.private_key.as_deref() != Some(key.as_slice()) {
                return Err(ApiError::validation("Private key and mnemonic mismatch"));
            }
        }
        params.address = recovered.address.clone();
        private_key = recovered.private_key.clone();
    }
    if params.address.is_empty() {
        return Err(ApiError::validation("Address or private key required"));
    }
    let watch_only = params.watch_only || private_key.is_none();

    let mnemonic = params.mnemonic.clone();
    let result = state.addresses.insert_with(&params.address, |record| {
        record.private_key = private_key;
        record.service_id = params.service_id;
        record.user_id = params.user_id;
        record.invoice_id = params.invoice_id;
        record.watch_only = watch_only;
        record.subscribed = true;
        record.mnemonic = mnemonic;
    });
    let response = match result {
        Ok(_) => AddressResponse {
            success: true,
            ..Default::default()
        },
        Err(AddressError::Exists) => AddressResponse {
            success: true,
            message: "Address already known".into(),
            ..Default::default()
        },
        Err(AddressError::KeyMismatch) => {
            return Err(ApiError::validation("Address and private key mismatch"))
        }
        Err(e) => return Err(ApiError::server(e.to_string())),
    };
    serde_json::to_value(response).map_err(|e| ApiError::server(e.to_string()))
}

pub async fn recover(
    state: &ApiState,
    _ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(default)]
        mnemonic: Vec<String>,
    }
    let params: Params = request.parse_params()?;
    let record = state
        .addresses
        .recover_bip44(&params.mnemonic)
        .map_err(|_| ApiError::validation("Invalid mnemonic"))?;
    serde_json::to_value(AddressResponse::full(&record))
        .map_err(|e| ApiError::server(e.to_string()))
}

pub async fn generate(
    state: &ApiState,
    _ctx: &RequestContext,
    request: &JsonRpcRequest,
) -> Result<Value, ApiError> {
    #[derive(Deserialize)]
    struct Params {
        #[serde(rename = "mnemonicLen", default = "default_len")]
        mnemonic_len: usize,
    }
    fn default_len() -> usize {
        12
    }
    let params: Params = request.parse_params()?;
    let record = state
        .addresses
        .generate_bip44(params.mnemonic_len)
        .map_err(|e| match e {
            AddressError::InvalidMnemonicLength => ApiError::validation(e.to_string()),
            other => ApiError::server(other.to_string()),
        })?;
    serde_json::to_value(AddressResponse::full(&record))
        .map_err(|e| ApiError::server(e.to_string()))
}
