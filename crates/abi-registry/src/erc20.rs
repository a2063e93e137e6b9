//! The fixed ERC-20 surface the adapter understands.

use crate::entry::{AbiEntry, AbiParam, AbiValue, ContractAbi, ParamType};
use crate::errors::AbiError;
use primitive_types::U256;

fn param(name: &str, kind: ParamType) -> AbiParam {
    AbiParam {
        name: name.to_string(),
        kind,
    }
}

/// The standard ERC-20 methods. Only `transfer` and `balanceOf` are
/// exercised; the rest keep selector matching honest for observed calls.
pub fn erc20_abi() -> ContractAbi {
    ContractAbi {
        entries: vec![
            AbiEntry::function("name", vec![], vec![param("", ParamType::String)]),
            AbiEntry::function("symbol", vec![], vec![param("", ParamType::String)]),
            AbiEntry::function("decimals", vec![], vec![param("", ParamType::Uint8)]),
            AbiEntry::function("totalSupply", vec![], vec![param("", ParamType::Uint256)]),
            AbiEntry::function(
                "balanceOf",
                vec![param("_owner", ParamType::Address)],
                vec![param("balance", ParamType::Uint256)],
            ),
            AbiEntry::function(
                "transfer",
                vec![
                    param("_to", ParamType::Address),
                    param("_value", ParamType::Uint256),
                ],
                vec![param("success", ParamType::Bool)],
            ),
            AbiEntry::function(
                "transferFrom",
                vec![
                    param("_from", ParamType::Address),
                    param("_to", ParamType::Address),
                    param("_value", ParamType::Uint256),
                ],
                vec![param("success", ParamType::Bool)],
            ),
        ],
    }
}

/// Convenience wrapper binding the ERC-20 ABI to the operations the
/// pipeline needs.
#[derive(Debug, Clone)]
pub struct Erc20Abi {
    abi: ContractAbi,
}

impl Default for Erc20Abi {
    fn default() -> Self {
        Self::new()
    }
}

impl Erc20Abi {
    pub fn new() -> Self {
        Self { abi: erc20_abi() }
    }

    /// Whether the call-data invokes `transfer(address,uint256)`.
    pub fn is_transfer(&self, call_data: &[u8]) -> bool {
        self.abi
            .method_by_name("transfer")
            .map(|m| m.matches(call_data))
            .unwrap_or(false)
    }

    /// Decode `transfer` call-data into `(recipient, amount)`.
    pub fn decode_transfer(&self, call_data: &[u8]) -> Result<([u8; 20], U256), AbiError> {
        let method = self.abi.method_by_name("transfer")?;
        if !method.matches(call_data) {
            return Err(AbiError::NotTransfer);
        }
        let values = method.decode_inputs(call_data)?;
        match (&values[0], &values[1]) {
            (AbiValue::Address(to), AbiValue::Uint(amount)) => Ok((*to, *amount)),
            _ => Err(AbiError::InvalidParamsData),
        }
    }

    /// Encode a `transfer(address,uint256)` call. Fixed 68-byte payload.
    pub fn encode_transfer(&self, to: [u8; 20], amount: U256) -> Result<Vec<u8>, AbiError> {
        self.abi
            .method_by_name("transfer")?
            .encode_inputs(&[AbiValue::Address(to), AbiValue::Uint(amount)])
    }

    /// Encode a `balanceOf(address)` call.
    pub fn encode_balance_of(&self, owner: [u8; 20]) -> Result<Vec<u8>, AbiError> {
        self.abi
            .method_by_name("balanceOf")?
            .encode_inputs(&[AbiValue::Address(owner)])
    }

    /// Interpret an `eth_call` result as a single uint256.
    pub fn decode_amount(&self, data: &[u8]) -> U256 {
        U256::from_big_endian(&data[data.len().saturating_sub(32)..])
    }
}
