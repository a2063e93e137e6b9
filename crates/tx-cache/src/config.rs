//! Cache module configuration.

use crate::errors::TxCacheError;
use serde::{Deserialize, Serialize};
use storage::BinStore;
use tracing::warn;

/// Persisted under `<dataPath>/txcache/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxCacheConfig {
    #[serde(default)]
    pub debug: bool,
    /// Confirmation count after which a cached row is marked settled.
    pub confirmations: u64,
    /// How far behind the head the block tick still updates rows.
    #[serde(rename = "registerConfirmations")]
    pub register_confirmations: u64,
}

impl Default for TxCacheConfig {
    fn default() -> Self {
        Self {
            debug: false,
            confirmations: 20,
            register_confirmations: 50,
        }
    }
}

impl TxCacheConfig {
    pub fn load(store: &dyn BinStore) -> Result<Self, TxCacheError> {
        if !store.exists() {
            warn!("no txcache config found, seeding defaults");
            let config = Self::default();
            config.save(store)?;
            return Ok(config);
        }
        let payload = store.load()?;
        serde_json::from_slice(&payload).map_err(|e| TxCacheError::Payload(e.to_string()))
    }

    pub fn save(&self, store: &dyn BinStore) -> Result<(), TxCacheError> {
        let payload =
            serde_json::to_vec_pretty(self).map_err(|e| TxCacheError::Payload(e.to_string()))?;
        Ok(store.save(&payload)?)
    }
}
