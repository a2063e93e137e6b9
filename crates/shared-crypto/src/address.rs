//! EVM address codec: raw 20-byte identifiers, the mixed-case checksum
//! string form, and key → address derivation.
//!
//! A plain EVM address is raw hex with no integrity protection, unlike the
//! base58check forms used elsewhere. The mixed-case checksum re-encodes the
//! 40 hex digits so that letter casing carries a Keccak-derived check:
//! lowercase the digits, hash them, and uppercase every letter whose
//! position-corresponding nibble in the hash is `>= 8`.

use crate::ecdsa::KeyPair;
use crate::hashing::keccak256;
use shared_types::{AddressCodec, CodecError};

/// Produce the checksummed string form of a 20-byte address.
pub fn checksum_encode(address_bytes: &[u8]) -> Result<String, CodecError> {
    if address_bytes.len() != 20 {
        return Err(CodecError::InvalidAddressBytes);
    }
    let lower = hex::encode(address_bytes);
    let hash = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

/// True when the address carries a correct mixed-case checksum.
/// All-lowercase and all-uppercase forms are accepted as unchecksummed.
pub fn checksum_is_valid(address: &str) -> bool {
    let Some(digits) = address.strip_prefix("0x") else {
        return false;
    };
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    if digits.chars().all(|c| !c.is_ascii_uppercase())
        || digits.chars().all(|c| !c.is_ascii_lowercase())
    {
        return true;
    }
    match hex::decode(digits.to_ascii_lowercase()) {
        Ok(bytes) => checksum_encode(&bytes).map(|c| c == address).unwrap_or(false),
        Err(_) => false,
    }
}

/// The EVM implementation of [`AddressCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EthAddressCodec;

impl AddressCodec for EthAddressCodec {
    fn encode(&self, address_bytes: &[u8]) -> Result<String, CodecError> {
        checksum_encode(address_bytes)
    }

    fn decode(&self, address: &str) -> Result<Vec<u8>, CodecError> {
        let digits = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .ok_or(CodecError::InvalidAddress)?;
        if digits.len() != 40 {
            return Err(CodecError::InvalidAddress);
        }
        hex::decode(digits).map_err(|_| CodecError::InvalidAddress)
    }

    fn address_from_key(&self, private_key: &[u8]) -> Result<(String, [u8; 20]), CodecError> {
        let key = KeyPair::from_bytes(private_key).map_err(|_| CodecError::InvalidPrivateKey)?;
        let bytes = key.address_bytes();
        let address = checksum_encode(&bytes)?;
        Ok((address, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_checksum_vector() {
        let bytes = hex::decode("fb6916095ca1df60bb79ce92ce3ea74c37c5d359").unwrap();
        assert_eq!(
            checksum_encode(&bytes).unwrap(),
            "0xFb6916095ca1df60bB79Ce92cE3Ea74c37c5d359"
        );
    }

    #[test]
    fn checksum_is_case_insensitive_over_input() {
        let codec = EthAddressCodec;
        let lower = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
        let upper = "0xFB6916095CA1DF60BB79CE92CE3EA74C37C5D359";
        let a = codec.normalize(lower).unwrap();
        let b = codec.normalize(upper).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let codec = EthAddressCodec;
        let addr = "0xFb6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
        let bytes = codec.decode(addr).unwrap();
        assert_eq!(codec.encode(&bytes).unwrap(), addr);
    }

    #[test]
    fn rejects_malformed_addresses() {
        let codec = EthAddressCodec;
        assert!(codec.decode("fb6916095ca1df60bb79ce92ce3ea74c37c5d359").is_err());
        assert!(codec.decode("0x1234").is_err());
        assert!(codec.decode("0xzz6916095ca1df60bb79ce92ce3ea74c37c5d359").is_err());
        assert!(!codec.is_valid(""));
    }

    #[test]
    fn checksum_validation() {
        assert!(checksum_is_valid("0xFb6916095ca1df60bB79Ce92cE3Ea74c37c5d359"));
        assert!(checksum_is_valid("0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359"));
        // One flipped letter breaks the checksum.
        assert!(!checksum_is_valid("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359"));
    }

    #[test]
    fn derived_address_matches_key() {
        let codec = EthAddressCodec;
        let key = [0x11u8; 32];
        let (address, bytes) = codec.address_from_key(&key).unwrap();
        assert_eq!(codec.decode(&address).unwrap(), bytes.to_vec());
        // Same derivation twice, same result.
        let (address2, _) = codec.address_from_key(&key).unwrap();
        assert_eq!(address, address2);
    }
}
