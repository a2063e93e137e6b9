//! Watcher module configuration.

use crate::errors::WatchError;
use serde::{Deserialize, Serialize};
use storage::BinStore;
use tracing::warn;

/// Persisted under `<dataPath>/watchdog/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Whether the loop runs at all.
    pub run: bool,
    /// Poll interval in seconds.
    #[serde(rename = "pullInterval")]
    pub poll_interval: u64,
    #[serde(default)]
    pub debug: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            run: true,
            poll_interval: 5,
            debug: false,
        }
    }
}

impl WatchConfig {
    pub fn load(store: &dyn BinStore) -> Result<Self, WatchError> {
        if !store.exists() {
            warn!("no watcher config found, seeding defaults");
            let config = Self::default();
            config.save(store)?;
            return Ok(config);
        }
        let payload = store.load()?;
        serde_json::from_slice(&payload).map_err(|e| WatchError::Payload(e.to_string()))
    }

    pub fn save(&self, store: &dyn BinStore) -> Result<(), WatchError> {
        let payload =
            serde_json::to_vec_pretty(self).map_err(|e| WatchError::Payload(e.to_string()))?;
        Ok(store.save(&payload)?)
    }
}
