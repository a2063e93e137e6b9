//! ABI entries, selectors and the fixed-slot parameter codec.

use crate::errors::AbiError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_crypto::keccak256;
use std::sync::OnceLock;

/// The parameter types that occur in the supported call shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    #[serde(rename = "address")]
    Address,
    #[serde(rename = "uint256")]
    Uint256,
    #[serde(rename = "int256")]
    Int256,
    #[serde(rename = "uint8")]
    Uint8,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "string")]
    String,
}

impl ParamType {
    /// Canonical Solidity name as used in method signatures.
    pub fn canonical(&self) -> &'static str {
        match self {
            ParamType::Address => "address",
            ParamType::Uint256 => "uint256",
            ParamType::Int256 => "int256",
            ParamType::Uint8 => "uint8",
            ParamType::Bool => "bool",
            ParamType::String => "string",
        }
    }
}

/// A decoded or to-be-encoded parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address([u8; 20]),
    Uint(U256),
    Bool(bool),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamType,
}

/// One callable method of a contract ABI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbiEntry {
    pub name: String,
    #[serde(rename = "type", default = "default_entry_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<AbiParam>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<AbiParam>,
    #[serde(skip)]
    selector: OnceLock<[u8; 4]>,
}

fn default_entry_kind() -> String {
    "function".to_string()
}

impl AbiEntry {
    pub fn function(name: &str, inputs: Vec<AbiParam>, outputs: Vec<AbiParam>) -> Self {
        Self {
            name: name.to_string(),
            kind: default_entry_kind(),
            inputs,
            outputs,
            selector: OnceLock::new(),
        }
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.inputs.iter().map(|p| p.kind.canonical()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// First four bytes of the Keccak-256 of the canonical signature.
    /// Computed once and cached on the entry.
    pub fn selector(&self) -> [u8; 4] {
        *self.selector.get_or_init(|| {
            let digest = keccak256(self.signature().as_bytes());
            [digest[0], digest[1], digest[2], digest[3]]
        })
    }

    /// Whether the call-data invokes this method.
    pub fn matches(&self, call_data: &[u8]) -> bool {
        call_data.len() >= 4 && call_data[..4] == self.selector()
    }

    /// Encode selector + fixed 32-byte slots.
    pub fn encode_inputs(&self, values: &[AbiValue]) -> Result<Vec<u8>, AbiError> {
        if values.len() != self.inputs.len() {
            return Err(AbiError::ParamCountMismatch);
        }
        let mut out = Vec::with_capacity(4 + 32 * values.len());
        out.extend_from_slice(&self.selector());
        for (i, (param, value)) in self.inputs.iter().zip(values).enumerate() {
            let mut slot = [0u8; 32];
            match (param.kind, value) {
                (ParamType::Address, AbiValue::Address(addr)) => {
                    slot[12..].copy_from_slice(addr);
                }
                (ParamType::Uint256 | ParamType::Int256 | ParamType::Uint8, AbiValue::Uint(v)) => {
                    v.to_big_endian(&mut slot);
                }
                (ParamType::Bool, AbiValue::Bool(v)) => {
                    slot[31] = u8::from(*v);
                }
                _ => return Err(AbiError::ParamTypeMismatch(i)),
            }
            out.extend_from_slice(&slot);
        }
        Ok(out)
    }

    /// Strip the selector and walk the parameter list.
    pub fn decode_inputs(&self, call_data: &[u8]) -> Result<Vec<AbiValue>, AbiError> {
        if call_data.len() < 4 + 32 * self.inputs.len() {
            return Err(AbiError::InvalidParamsData);
        }
        let mut values = Vec::with_capacity(self.inputs.len());
        let mut data = &call_data[4..];
        for param in &self.inputs {
            let slot = &data[..32];
            let value = match param.kind {
                ParamType::Address => {
                    let mut addr = [0u8; 20];
                    addr.copy_from_slice(&slot[12..32]);
                    AbiValue::Address(addr)
                }
                ParamType::Uint256 | ParamType::Int256 | ParamType::Uint8 => {
                    AbiValue::Uint(U256::from_big_endian(slot))
                }
                ParamType::Bool => AbiValue::Bool(slot[31] != 0),
                ParamType::String => return Err(AbiError::ParamTypeMismatch(values.len())),
            };
            values.push(value);
            data = &data[32..];
        }
        Ok(values)
    }
}

/// A contract's callable surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractAbi {
    pub entries: Vec<AbiEntry>,
}

impl ContractAbi {
    pub fn method_by_name(&self, name: &str) -> Result<&AbiEntry, AbiError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or(AbiError::UnknownMethod)
    }

    pub fn method_by_selector(&self, selector: [u8; 4]) -> Result<&AbiEntry, AbiError> {
        self.entries
            .iter()
            .find(|e| e.selector() == selector)
            .ok_or(AbiError::UnknownMethod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_entry() -> AbiEntry {
        AbiEntry::function(
            "transfer",
            vec![
                AbiParam { name: "_to".into(), kind: ParamType::Address },
                AbiParam { name: "_value".into(), kind: ParamType::Uint256 },
            ],
            vec![AbiParam { name: "success".into(), kind: ParamType::Bool }],
        )
    }

    #[test]
    fn transfer_selector_is_a9059cbb() {
        assert_eq!(transfer_entry().selector(), [0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn signature_uses_canonical_names() {
        assert_eq!(transfer_entry().signature(), "transfer(address,uint256)");
    }

    #[test]
    fn encode_is_68_bytes() {
        let entry = transfer_entry();
        let encoded = entry
            .encode_inputs(&[
                AbiValue::Address([0x11; 20]),
                AbiValue::Uint(U256::from(1_000u64)),
            ])
            .unwrap();
        assert_eq!(encoded.len(), 68);
        assert_eq!(&encoded[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        // Address occupies bytes 12..32 of the first slot.
        assert_eq!(&encoded[4..16], &[0u8; 12]);
        assert_eq!(&encoded[16..36], &[0x11; 20]);
    }

    #[test]
    fn decode_inverts_encode() {
        let entry = transfer_entry();
        let values = vec![
            AbiValue::Address([0xAB; 20]),
            AbiValue::Uint(U256::from(123_456_789u64)),
        ];
        let encoded = entry.encode_inputs(&values).unwrap();
        assert_eq!(entry.decode_inputs(&encoded).unwrap(), values);
    }

    #[test]
    fn short_call_data_is_rejected() {
        let entry = transfer_entry();
        let encoded = entry
            .encode_inputs(&[AbiValue::Address([0; 20]), AbiValue::Uint(U256::zero())])
            .unwrap();
        assert!(matches!(
            entry.decode_inputs(&encoded[..40]),
            Err(AbiError::InvalidParamsData)
        ));
    }

    #[test]
    fn bool_slot_reads_byte_31() {
        let entry = AbiEntry::function(
            "setPaused",
            vec![AbiParam { name: "p".into(), kind: ParamType::Bool }],
            vec![],
        );
        let mut data = entry.encode_inputs(&[AbiValue::Bool(false)]).unwrap();
        assert_eq!(entry.decode_inputs(&data).unwrap(), vec![AbiValue::Bool(false)]);
        data[35] = 0x02; // anything non-zero is true
        assert_eq!(entry.decode_inputs(&data).unwrap(), vec![AbiValue::Bool(true)]);
    }

    #[test]
    fn param_count_mismatch() {
        let entry = transfer_entry();
        assert!(matches!(
            entry.encode_inputs(&[AbiValue::Bool(true)]),
            Err(AbiError::ParamCountMismatch)
        ));
    }
}
