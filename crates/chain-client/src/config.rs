//! Chain client module configuration.

use serde::{Deserialize, Serialize};
use shared_types::{ChainError, TokenInfo};
use storage::BinStore;
use tracing::warn;

pub const DEFAULT_CONFIRMATIONS: u64 = 12;

/// Persisted under `<dataPath>/client/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "chainName")]
    pub chain_name: String,
    #[serde(rename = "chainId")]
    pub chain_id: String,
    #[serde(rename = "chainSymbol")]
    pub chain_symbol: String,
    pub decimals: u32,
    pub confirmations: u64,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub tokens: Vec<TokenInfo>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chain_name: "Ethereum".into(),
            chain_id: "ethereum".into(),
            chain_symbol: "ETH".into(),
            decimals: 18,
            confirmations: DEFAULT_CONFIRMATIONS,
            debug: false,
            tokens: vec![
                TokenInfo {
                    contract_address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".into(),
                    name: "TetherToken".into(),
                    symbol: "USDT".into(),
                    decimals: 6,
                    protocol: "ERC20".into(),
                },
                TokenInfo {
                    contract_address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".into(),
                    name: "USD Coin".into(),
                    symbol: "USDC".into(),
                    decimals: 6,
                    protocol: "ERC20".into(),
                },
            ],
        }
    }
}

impl ClientConfig {
    /// Load from the store, writing defaults on first run.
    pub fn load(store: &dyn BinStore) -> Result<Self, ChainError> {
        if !store.exists() {
            warn!("no client config found, seeding defaults");
            let config = Self::default();
            config.save(store)?;
            return Ok(config);
        }
        let payload = store
            .load()
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        serde_json::from_slice(&payload).map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }

    pub fn save(&self, store: &dyn BinStore) -> Result<(), ChainError> {
        let payload = serde_json::to_vec_pretty(self)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))?;
        store
            .save(&payload)
            .map_err(|e| ChainError::InvalidResponse(e.to_string()))
    }
}
