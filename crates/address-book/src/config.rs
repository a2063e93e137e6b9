//! Address book module configuration.

use crate::errors::AddressError;
use serde::{Deserialize, Serialize};
use storage::BinStore;
use tracing::warn;

/// Persisted under `<dataPath>/address/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressBookConfig {
    #[serde(default)]
    pub debug: bool,
    /// Whether the free pool refills itself.
    #[serde(rename = "enableAddressGenerate")]
    pub enable_generate: bool,
    /// Refill once the free pool drops below this.
    #[serde(rename = "minFreePoolSize")]
    pub min_free_pool: usize,
    /// Refill back up to this.
    #[serde(rename = "generatePoolUpTo")]
    pub generate_up_to: usize,
    /// Generate pool addresses with mnemonics instead of bare keys.
    #[serde(rename = "bip39Support")]
    pub bip39: bool,
    #[serde(rename = "mnemonicLen")]
    pub mnemonic_len: usize,
}

impl Default for AddressBookConfig {
    fn default() -> Self {
        Self {
            debug: false,
            enable_generate: true,
            min_free_pool: 100,
            generate_up_to: 110,
            bip39: false,
            mnemonic_len: 12,
        }
    }
}

impl AddressBookConfig {
    pub fn load(store: &dyn BinStore) -> Result<Self, AddressError> {
        if !store.exists() {
            warn!("no address book config found, seeding defaults");
            let config = Self::default();
            config.save(store)?;
            return Ok(config);
        }
        let payload = store.load()?;
        let mut config: Self =
            serde_json::from_slice(&payload).map_err(|e| AddressError::Payload(e.to_string()))?;
        if config.mnemonic_len == 0 {
            config.mnemonic_len = 12;
        }
        Ok(config)
    }

    pub fn save(&self, store: &dyn BinStore) -> Result<(), AddressError> {
        let payload =
            serde_json::to_vec_pretty(self).map_err(|e| AddressError::Payload(e.to_string()))?;
        Ok(store.save(&payload)?)
    }
}
