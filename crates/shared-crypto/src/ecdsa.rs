//! Recoverable secp256k1 ECDSA.
//!
//! Signing uses RFC-6979 deterministic nonces, so a `(key, digest)` pair
//! always produces the same signature. The signature is normalized to the
//! low-s form; when normalization flips s, the recovery id flips with it so
//! the y-parity stays consistent with the recovered point.

use crate::errors::CryptoError;
use crate::hashing::keccak256;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use zeroize::Zeroize;

/// A 65-byte recoverable signature split into its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// y-parity of the nonce point, adjusted by low-s normalization.
    /// Always 0 or 1.
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// Serialize as `r || s || recovery_id`.
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.recovery_id;
        out
    }
}

/// A secp256k1 keypair over a 32-byte private scalar.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    pub fn from_bytes(private_key: &[u8]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(private_key).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Private scalar as 32 big-endian bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }

    /// Uncompressed public key, `0x04 || X || Y`.
    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        let point = self.signing_key.verifying_key().to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// The 20-byte account identifier:
    /// `keccak256(uncompressed_pubkey[1..])[12..32]`.
    pub fn address_bytes(&self) -> [u8; 20] {
        let pubkey = self.public_key_uncompressed();
        let digest = keccak256(&pubkey[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&digest[12..]);
        address
    }

    /// Sign a 32-byte digest deterministically (RFC-6979, SHA-256 HMAC).
    ///
    /// Never fails for a valid key: nonce rejection is handled by
    /// re-derivation inside the signer.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
        let (sig, recid) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|_| CryptoError::SigningFailed)?;
        let (sig, recid) = normalize(sig, recid);

        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recid.to_byte(),
        })
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

/// Low-s normalization with the matching recovery-id flip.
fn normalize(sig: Signature, recid: RecoveryId) -> (Signature, RecoveryId) {
    match sig.normalize_s() {
        Some(normalized) => {
            let flipped = RecoveryId::from_byte(recid.to_byte() ^ 1).unwrap_or(recid);
            (normalized, flipped)
        }
        None => (sig, recid),
    }
}

/// Recover the signer's address bytes from a digest and signature.
pub fn recover_address_bytes(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<[u8; 20], CryptoError> {
    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(&signature.r);
    sig_bytes[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| CryptoError::SigningFailed)?;
    let recid =
        RecoveryId::from_byte(signature.recovery_id).ok_or(CryptoError::SigningFailed)?;
    let key = VerifyingKey::recover_from_prehash(digest, &sig, recid)
        .map_err(|_| CryptoError::SigningFailed)?;
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Ok(address)
}
