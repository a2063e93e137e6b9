//! Engine module configuration.

use crate::errors::SubscriptionError;
use serde::{Deserialize, Serialize};
use storage::BinStore;
use tracing::warn;

/// Persisted under `<dataPath>/subscriptions/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub debug: bool,
}

impl EngineConfig {
    pub fn load(store: &dyn BinStore) -> Result<Self, SubscriptionError> {
        if !store.exists() {
            warn!("no subscriptions config found, seeding defaults");
            let config = Self::default();
            config.save(store)?;
            return Ok(config);
        }
        let payload = store.load()?;
        serde_json::from_slice(&payload).map_err(|e| SubscriptionError::Payload(e.to_string()))
    }

    pub fn save(&self, store: &dyn BinStore) -> Result<(), SubscriptionError> {
        let payload = serde_json::to_vec_pretty(self)
            .map_err(|e| SubscriptionError::Payload(e.to_string()))?;
        Ok(store.save(&payload)?)
    }
}
