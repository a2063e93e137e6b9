//! Persisted last-seen chain state.

use crate::errors::WatchError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use storage::BinStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LastSeen {
    #[serde(rename = "lastBlockNum")]
    last_block_number: u64,
    #[serde(rename = "lastCheckTime")]
    last_check_time: i64,
}

/// The single persistent tuple `(last_block_number, last_check_time)`.
///
/// Owned exclusively by the watch loop. On a cold start the height is
/// zero, which re-scans from genesis; operators pre-set the file for
/// chains where that is impractical.
pub struct LastSeenState {
    store: Arc<dyn BinStore>,
    state: LastSeen,
}

impl LastSeenState {
    /// Load, initializing an empty store to height zero.
    pub fn load(store: Arc<dyn BinStore>) -> Result<Self, WatchError> {
        let mut this = Self {
            store,
            state: LastSeen::default(),
        };
        if !this.store.exists() {
            this.update(0)?;
            return Ok(this);
        }
        let payload = this.store.load()?;
        this.state =
            serde_json::from_slice(&payload).map_err(|e| WatchError::Payload(e.to_string()))?;
        Ok(this)
    }

    /// Start instead from an operator-chosen height.
    pub fn load_at(store: Arc<dyn BinStore>, block_number: u64) -> Result<Self, WatchError> {
        let mut this = Self {
            store,
            state: LastSeen::default(),
        };
        this.update(block_number)?;
        Ok(this)
    }

    pub fn block_number(&self) -> u64 {
        self.state.last_block_number
    }

    /// Persist a newly completed height.
    pub fn update(&mut self, block_number: u64) -> Result<(), WatchError> {
        self.state.last_block_number = block_number;
        self.state.last_check_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        let payload = serde_json::to_vec_pretty(&self.state)
            .map_err(|e| WatchError::Payload(e.to_string()))?;
        Ok(self.store.save(&payload)?)
    }
}
