//! # Storage
//!
//! Persistence primitives shared by every stateful subsystem:
//!
//! - [`BinStore`] — load/save of one opaque byte payload, used for module
//!   configs and small state files. The file implementation lives under
//!   `<dataPath>/<module>/<file>`.
//! - [`KvDb`] — a RocksDB database with named column families, used for
//!   the address pool, the transaction ledger and the transaction cache.
//! - [`StorageManager`] — hands each module its own directory so the data
//!   path stays tidy: `<dataPath>/<module>/{config.json, *.db}`.

pub mod bin_store;
pub mod errors;
pub mod kv;
pub mod module;

pub use bin_store::{BinFileStore, BinStore, MemoryBinStore};
pub use errors::StorageError;
pub use kv::{KvBatch, KvDb};
pub use module::{ModuleStorage, StorageManager};
