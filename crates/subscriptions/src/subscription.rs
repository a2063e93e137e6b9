//! Subscriptions and their persistent store.

use crate::errors::SubscriptionError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use storage::BinStore;
use url::Url;

pub type ServiceId = u64;

/// The distinguished internal service: notifications go to the log only.
pub const INTERNAL_SERVICE: ServiceId = 0;

/// One downstream service's delivery configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(rename = "serviceName", default, skip_serializing_if = "String::is_empty")]
    pub service_name: String,
    #[serde(rename = "serviceId")]
    pub service_id: ServiceId,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub internal: bool,
    /// Expected in `X-Api-Token` on secured API calls for this service.
    #[serde(rename = "apiToken", default, skip_serializing_if = "String::is_empty")]
    pub api_token: String,
    /// Key used to sign outgoing notification payloads.
    #[serde(rename = "apiKey", default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    #[serde(rename = "eventUrl", default, skip_serializing_if = "String::is_empty")]
    pub event_url: String,
    #[serde(rename = "reportNewBlock", default)]
    pub report_new_block: bool,
    #[serde(rename = "reportIncomingTx", default)]
    pub report_incoming_tx: bool,
    #[serde(rename = "reportOutgoingTx", default)]
    pub report_outgoing_tx: bool,
    #[serde(rename = "reportMainCoin", default)]
    pub report_main_coin: bool,
    #[serde(rename = "reportTokens", default)]
    pub report_tokens: HashMap<String, bool>,
    #[serde(rename = "gatherToMaster", default)]
    pub gather_to_master: bool,
    #[serde(rename = "masterList", default, skip_serializing_if = "Vec::is_empty")]
    pub master_list: Vec<String>,
}

impl Subscription {
    /// A non-internal subscription needs a syntactically valid absolute
    /// URL; gather-to-master needs at least one sweep destination.
    pub fn validate(&self) -> Result<(), SubscriptionError> {
        if !self.internal {
            Url::parse(&self.event_url)
                .map_err(|e| SubscriptionError::InvalidEventUrl(e.to_string()))?;
        }
        if self.gather_to_master && self.master_list.is_empty() {
            return Err(SubscriptionError::EmptyMasterList);
        }
        Ok(())
    }

    pub fn reports_token(&self, symbol: &str) -> bool {
        self.report_tokens.get(symbol).copied().unwrap_or(false)
    }
}

/// All subscriptions keyed by service id, persisted as one JSON payload.
pub struct SubscriptionStore {
    store: Arc<dyn BinStore>,
    inner: RwLock<HashMap<ServiceId, Subscription>>,
}

impl SubscriptionStore {
    /// Load from the store, seeding the internal service on first run.
    pub fn load(store: Arc<dyn BinStore>) -> Result<Self, SubscriptionError> {
        let this = Self {
            store,
            inner: RwLock::new(HashMap::new()),
        };
        if !this.store.exists() {
            this.inner.write().insert(
                INTERNAL_SERVICE,
                Subscription {
                    service_id: INTERNAL_SERVICE,
                    internal: true,
                    ..Default::default()
                },
            );
            this.save()?;
            return Ok(this);
        }
        let payload = this.store.load()?;
        let map: HashMap<ServiceId, Subscription> =
            serde_json::from_slice(&payload).map_err(|e| SubscriptionError::Payload(e.to_string()))?;
        *this.inner.write() = map;
        Ok(this)
    }

    fn save(&self) -> Result<(), SubscriptionError> {
        let inner = self.inner.read();
        let payload = serde_json::to_vec_pretty(&*inner)
            .map_err(|e| SubscriptionError::Payload(e.to_string()))?;
        Ok(self.store.save(&payload)?)
    }

    pub fn get(&self, service_id: ServiceId) -> Result<Subscription, SubscriptionError> {
        self.inner
            .read()
            .get(&service_id)
            .cloned()
            .ok_or(SubscriptionError::UnknownService)
    }

    /// Register a new service subscription.
    pub fn insert(&self, subscription: Subscription) -> Result<(), SubscriptionError> {
        subscription.validate()?;
        self.inner
            .write()
            .insert(subscription.service_id, subscription);
        self.save()
    }

    /// Edit in place; the edited subscription is validated before the
    /// store is rewritten.
    pub fn edit(
        &self,
        service_id: ServiceId,
        edit: impl FnOnce(&mut Subscription),
    ) -> Result<Subscription, SubscriptionError> {
        let edited = {
            let mut inner = self.inner.write();
            let subscription = inner
                .get_mut(&service_id)
                .ok_or(SubscriptionError::UnknownService)?;
            let backup = subscription.clone();
            edit(subscription);
            if let Err(e) = subscription.validate() {
                *subscription = backup;
                return Err(e);
            }
            subscription.clone()
        };
        self.save()?;
        Ok(edited)
    }

    /// Visit every subscription under the read lock.
    pub fn view_all(&self, mut view: impl FnMut(&Subscription)) {
        for subscription in self.inner.read().values() {
            view(subscription);
        }
    }
}
