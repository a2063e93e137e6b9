//! # Chain Client
//!
//! The upstream half of the adapter: a JSON-RPC 2.0 client for an
//! EVM-compatible node, over HTTP or a local stream socket, plus the
//! transaction classification pipeline that projects raw chain
//! transactions into [`shared_types::TransferRecord`]s.
//!
//! The rest of the workspace consumes this crate only through the
//! `shared-types` chain traits; nothing above this layer sees HTTP types
//! or wire structs.

pub mod client;
pub mod config;
pub mod decode;
pub mod jsonrpc;
pub mod methods;
pub mod send;
pub mod transport;
pub mod wire;

pub use client::EvmClient;
pub use config::ClientConfig;
pub use jsonrpc::{RpcErrorObject, RpcRequest, RpcResponse};
pub use transport::{HttpTransport, RpcTransport};

#[cfg(unix)]
pub use transport::IpcTransport;
