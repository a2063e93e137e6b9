//! Keccak-256 hashing.

use sha3::{Digest, Keccak256};

/// Keccak-256 digest of a single byte string.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Keccak-256 over the concatenation of several segments, hashed as a
/// single message.
pub fn keccak256_concat(segments: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for segment in segments {
        hasher.update(segment);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_digest() {
        // Keccak-256(""), distinct from SHA3-256("").
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn erc20_transfer_selector() {
        let digest = keccak256(b"transfer(address,uint256)");
        assert_eq!(&digest[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn concat_matches_single_message() {
        let whole = keccak256(b"hello world");
        let parts = keccak256_concat(&[b"hello", b" ", b"world"]);
        assert_eq!(whole, parts);
    }
}
