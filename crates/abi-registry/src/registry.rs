//! Persistent registry of known token contracts.
//!
//! The classification pipeline consults this registry for every
//! non-empty-input transaction: an unknown `to` address means the
//! transaction is skipped as unsupported, a known one supplies the token
//! metadata attached to the decoded transfer.

use crate::errors::AbiError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::TokenInfo;
use std::collections::HashMap;
use std::sync::Arc;
use storage::BinStore;
use tracing::{error, warn};

/// One known contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractInfo {
    pub name: String,
    pub symbol: String,
    #[serde(rename = "contract_address")]
    pub contract_address: String,
    pub decimals: u32,
    #[serde(rename = "origin_gas_limit", default)]
    pub gas_limit: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
}

impl ContractInfo {
    pub fn token_info(&self) -> TokenInfo {
        TokenInfo {
            contract_address: self.contract_address.clone(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            protocol: self.protocol.clone(),
        }
    }
}

#[derive(Default)]
struct Inner {
    contracts: Vec<ContractInfo>,
    by_address: HashMap<String, usize>,
    by_symbol: HashMap<String, usize>,
}

impl Inner {
    fn reindex(&mut self) {
        self.by_address.clear();
        self.by_symbol.clear();
        for (i, c) in self.contracts.iter().enumerate() {
            self.by_address.insert(c.contract_address.to_lowercase(), i);
            self.by_symbol.insert(c.symbol.to_lowercase(), i);
        }
    }

    fn add(&mut self, contract: ContractInfo) {
        for existing in &self.contracts {
            if existing.name == contract.name
                && existing.contract_address == contract.contract_address
            {
                return;
            }
            if existing.name == contract.name {
                error!(name = %contract.name, "duplicated contract name");
                return;
            }
            if existing.contract_address.eq_ignore_ascii_case(&contract.contract_address) {
                error!(address = %contract.contract_address, "duplicated contract address");
                return;
            }
        }
        self.contracts.push(contract);
        self.reindex();
    }
}

/// Thread-safe registry with JSON persistence.
pub struct ContractRegistry {
    inner: RwLock<Inner>,
    store: Arc<dyn BinStore>,
}

impl ContractRegistry {
    pub fn new(store: Arc<dyn BinStore>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            store,
        }
    }

    /// Load from the store, seeding the default contract set on first run.
    pub fn init(&self) -> Result<(), AbiError> {
        if !self.store.exists() {
            self.cold_start()?;
        }
        let payload = self
            .store
            .load()
            .map_err(|e| AbiError::Payload(e.to_string()))?;
        let contracts: Vec<ContractInfo> =
            serde_json::from_slice(&payload).map_err(|e| AbiError::Payload(e.to_string()))?;
        let mut inner = self.inner.write();
        inner.contracts = contracts;
        inner.reindex();
        Ok(())
    }

    fn cold_start(&self) -> Result<(), AbiError> {
        warn!("no known-contract store found, seeding defaults");
        {
            let mut inner = self.inner.write();
            for contract in default_contracts() {
                inner.add(contract);
            }
        }
        self.save()
    }

    pub fn save(&self) -> Result<(), AbiError> {
        let inner = self.inner.read();
        let payload = serde_json::to_vec_pretty(&inner.contracts)
            .map_err(|e| AbiError::Payload(e.to_string()))?;
        self.store
            .save(&payload)
            .map_err(|e| AbiError::Payload(e.to_string()))
    }

    pub fn add(&self, contract: ContractInfo) -> Result<(), AbiError> {
        self.inner.write().add(contract);
        self.save()
    }

    pub fn by_address(&self, contract_address: &str) -> Result<ContractInfo, AbiError> {
        let inner = self.inner.read();
        inner
            .by_address
            .get(&contract_address.to_lowercase())
            .map(|i| inner.contracts[*i].clone())
            .ok_or(AbiError::UnknownContract)
    }

    pub fn by_symbol(&self, symbol: &str) -> Result<ContractInfo, AbiError> {
        let inner = self.inner.read();
        inner
            .by_symbol
            .get(&symbol.to_lowercase())
            .map(|i| inner.contracts[*i].clone())
            .ok_or(AbiError::UnknownContract)
    }

    pub fn list(&self) -> Vec<ContractInfo> {
        self.inner.read().contracts.clone()
    }
}

fn default_contracts() -> Vec<ContractInfo> {
    vec![
        ContractInfo {
            name: "TetherToken".into(),
            symbol: "USDT".into(),
            contract_address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".into(),
            decimals: 6,
            gas_limit: 60_000,
            protocol: "ERC20".into(),
        },
        ContractInfo {
            name: "USD Coin".into(),
            symbol: "USDC".into(),
            contract_address: "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".into(),
            decimals: 6,
            gas_limit: 60_000,
            protocol: "ERC20".into(),
        },
    ]
}
