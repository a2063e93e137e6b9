//! `0x`-prefixed hex quantities as used on the EVM JSON-RPC wire.
//!
//! Nodes encode every numeric field as a hex string. A bare `"0x"` is a
//! valid zero for some fields (`gas`, `nonce`, `transactionIndex`), so the
//! parsers here accept it everywhere.

use crate::errors::HexError;
use primitive_types::U256;

/// Parse a `0x`-prefixed quantity into a `u64`. `"0x"` parses as zero.
pub fn parse_hex_u64(value: &str) -> Result<u64, HexError> {
    let digits = strip_prefix(value);
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16).map_err(|_| HexError(value.to_string()))
}

/// Parse a `0x`-prefixed quantity into a `U256`. `"0x"` parses as zero.
pub fn parse_hex_u256(value: &str) -> Result<U256, HexError> {
    let digits = strip_prefix(value);
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16).map_err(|_| HexError(value.to_string()))
}

/// Parse `0x`-prefixed data bytes. An odd digit count gets a leading zero,
/// matching how nodes serialize big integers.
pub fn parse_hex_bytes(value: &str) -> Result<Vec<u8>, HexError> {
    let digits = strip_prefix(value);
    if digits.is_empty() {
        return Ok(Vec::new());
    }
    let padded;
    let digits = if digits.len() % 2 == 1 {
        padded = format!("0{digits}");
        &padded
    } else {
        digits
    };
    hex::decode(digits).map_err(|_| HexError(value.to_string()))
}

pub fn u64_to_hex(value: u64) -> String {
    format!("0x{value:x}")
}

pub fn u256_to_hex(value: U256) -> String {
    format!("0x{value:x}")
}

pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn strip_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}
