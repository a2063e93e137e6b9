//! # RPC Endpoint
//!
//! The downstream JSON-RPC 2.0 API over HTTP. Method names are accepted
//! in both dotted and camelCase form (`address.get.new` ≡
//! `addressGetNew`). Secured methods authenticate via the `X-Api-Token`
//! header against the target service's configured token.
//!
//! Error mapping follows the standard codes: `-32700` parse, `-32600`
//! invalid request, `-32601` unknown method, `-32000` server, `-32001`
//! unauthorized. Validation failures never log above debug; unauthorized
//! attempts log at warn.

pub mod amount;
pub mod envelope;
pub mod errors;
pub mod methods;
pub mod router;
pub mod server;
pub mod state;

pub use envelope::{JsonRpcRequest, JsonRpcResponse};
pub use errors::ApiError;
pub use server::serve;
pub use state::ApiState;
