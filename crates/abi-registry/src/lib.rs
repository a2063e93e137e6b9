//! # ABI Registry
//!
//! The fixed-shape ABI support the adapter needs: 4-byte method selectors
//! over canonical signatures, the `transfer(address,uint256)` codec used
//! for observed and outbound token transfers, and a persistent registry of
//! known token contracts.
//!
//! The decoder matches only on known selectors. Unknown call-data is a
//! first-class "not a transfer" outcome, not an error.

pub mod entry;
pub mod erc20;
pub mod errors;
pub mod registry;

pub use entry::{AbiEntry, AbiParam, AbiValue, ContractAbi, ParamType};
pub use erc20::Erc20Abi;
pub use errors::AbiError;
pub use registry::{ContractInfo, ContractRegistry};
