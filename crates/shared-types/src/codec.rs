//! Address codec boundary.

use crate::errors::CodecError;

/// Byte/string conversion for one chain's address format.
///
/// The EVM implementation lives in `shared-crypto` (raw hex with the
/// mixed-case checksum); other chains supply their own encoding without
/// the rest of the pipeline noticing.
pub trait AddressCodec: Send + Sync {
    /// Encode a raw 20-byte identifier into the canonical string form.
    fn encode(&self, address_bytes: &[u8]) -> Result<String, CodecError>;

    /// Decode the string form back into raw bytes.
    fn decode(&self, address: &str) -> Result<Vec<u8>, CodecError>;

    /// Derive the address belonging to a 32-byte private key.
    fn address_from_key(&self, private_key: &[u8]) -> Result<(String, [u8; 20]), CodecError>;

    fn is_valid(&self, address: &str) -> bool {
        self.decode(address).is_ok()
    }

    /// Re-encode an address into canonical (checksummed) form. Empty input
    /// stays empty: mempool transactions may have no recipient yet.
    fn normalize(&self, address: &str) -> Result<String, CodecError> {
        if address.is_empty() {
            return Ok(String::new());
        }
        let bytes = self.decode(address)?;
        self.encode(&bytes)
    }
}
