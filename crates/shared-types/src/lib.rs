//! # Shared Types
//!
//! Core data model and cross-subsystem traits for the EVM backend adapter.
//!
//! Every subsystem crate depends on this one and nothing else depends on a
//! subsystem crate from here, so the workspace dependency graph stays a DAG:
//!
//! - [`TransferRecord`] / [`BlockSummary`] — the semantic projection of
//!   chain transactions and blocks, produced by the chain client and
//!   consumed by the watcher, the subscription engine and the cache.
//! - The [`chain`] trait family — the narrow capability set a chain
//!   adapter must supply. A second chain implementation plugs in here
//!   without touching the event bus or the subscription engine.
//! - [`AddressCodec`] — byte/string address conversion, implemented per
//!   chain (mixed-case checksum hex for EVM).

pub mod chain;
pub mod codec;
pub mod errors;
pub mod hexnum;
pub mod transfer;

pub use chain::{ChainBalances, ChainClient, ChainInfo, ChainReader, ChainTransfers, TransferCache};
pub use codec::AddressCodec;
pub use errors::{ChainError, CodecError};
pub use transfer::{BlockSummary, TokenInfo, TransferRecord};
