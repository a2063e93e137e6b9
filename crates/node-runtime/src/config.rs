//! Global configuration.
//!
//! HCL is the preferred on-disk form; JSON is accepted and upgraded to
//! HCL on the next save. A missing file cold-starts with local-node
//! defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(rename = "nodeUrl")]
    pub node_url: String,
    #[serde(rename = "nodePort")]
    pub node_port: String,
    #[serde(rename = "nodeUseSSL", default)]
    pub node_use_ssl: bool,
    #[serde(rename = "nodeUseIPC", default)]
    pub node_use_ipc: bool,
    #[serde(rename = "nodeIPCSocket", default)]
    pub node_ipc_socket: String,
    #[serde(rename = "rpcAddress")]
    pub rpc_address: String,
    #[serde(rename = "rpcPort")]
    pub rpc_port: String,
    #[serde(rename = "dataPath")]
    pub data_path: String,
    #[serde(rename = "debugMode", default)]
    pub debug_mode: bool,
    #[serde(rename = "additionalHeaders", default)]
    pub additional_headers: HashMap<String, String>,
    #[serde(rename = "burnAddress", default)]
    pub burn_address: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            node_url: "localhost".into(),
            node_port: "8545".into(),
            node_use_ssl: false,
            node_use_ipc: false,
            node_ipc_socket: String::new(),
            rpc_address: "localhost".into(),
            rpc_port: "21080".into(),
            data_path: "data".into(),
            debug_mode: false,
            additional_headers: HashMap::new(),
            burn_address: String::new(),
        }
    }
}

impl GlobalConfig {
    /// Load from `path`, accepting HCL or JSON. A JSON file is rewritten
    /// as HCL; a missing file is created with defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "no global config found, writing defaults");
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("can not read config {}", path.display()))?;
        if let Ok(config) = hcl::from_str::<Self>(&raw) {
            return Ok(config);
        }
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("config {} is neither HCL nor JSON", path.display()))?;
        info!(path = %path.display(), "json config accepted, upgrading to hcl");
        config.save(path)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let rendered = hcl::to_string(self).context("can not render config as hcl")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, rendered)
            .with_context(|| format!("can not write config {}", path.display()))?;
        Ok(())
    }

    /// The upstream HTTP endpoint derived from url/port/ssl.
    pub fn node_http_url(&self) -> String {
        let scheme = if self.node_use_ssl { "https" } else { "http" };
        format!("{scheme}://{}:{}", self.node_url, self.node_port)
    }

    /// The downstream bind address.
    pub fn rpc_bind_addr(&self) -> String {
        format!("{}:{}", self.rpc_address, self.rpc_port)
    }
}
