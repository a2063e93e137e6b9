//! BIP-39 mnemonic generation/recovery with BIP-44 key derivation.
//!
//! The only path in use is `m/44'/60'/0'/0/0`. Child-key derivation is the
//! standard HMAC-SHA512 construction over secp256k1 scalars: hardened steps
//! feed `0x00 || key || index`, normal steps feed the compressed public
//! key, and the child scalar is `(IL + parent) mod n`.

use crate::errors::CryptoError;
use bip39::Mnemonic;
use hmac::{Hmac, Mac};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::{Field, PrimeField};
use k256::Scalar;
use rand::RngCore;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// The fixed derivation path.
pub const DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

const HARDENED: u32 = 0x8000_0000;
const PATH: [u32; 5] = [HARDENED + 44, HARDENED + 60, HARDENED, 0, 0];

/// A derived key together with its mnemonic word list.
pub struct MnemonicKey {
    pub words: Vec<String>,
    pub private_key: [u8; 32],
}

/// Generate a fresh mnemonic of 12 or 24 words and derive its key.
pub fn generate(word_count: usize) -> Result<MnemonicKey, CryptoError> {
    let entropy_len = match word_count {
        12 => 16,
        24 => 32,
        _ => return Err(CryptoError::InvalidMnemonicLength),
    };
    let mut entropy = vec![0u8; entropy_len];
    rand::thread_rng().fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    from_mnemonic(&mnemonic)
}

/// Recover the key belonging to an existing word list.
pub fn recover(words: &[String]) -> Result<MnemonicKey, CryptoError> {
    let phrase = words.join(" ");
    let mnemonic = Mnemonic::parse_normalized(&phrase)
        .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
    from_mnemonic(&mnemonic)
}

fn from_mnemonic(mnemonic: &Mnemonic) -> Result<MnemonicKey, CryptoError> {
    let seed = mnemonic.to_seed("");
    let private_key = derive_path(&seed, &PATH)?;
    let words = mnemonic
        .to_string()
        .split_whitespace()
        .map(String::from)
        .collect();
    Ok(MnemonicKey { words, private_key })
}

fn derive_path(seed: &[u8], path: &[u32]) -> Result<[u8; 32], CryptoError> {
    let mut mac =
        HmacSha512::new_from_slice(b"Bitcoin seed").map_err(|_| CryptoError::KeyDerivation)?;
    mac.update(seed);
    let out = mac.finalize().into_bytes();
    let mut key: [u8; 32] = out[..32].try_into().map_err(|_| CryptoError::KeyDerivation)?;
    let mut chain_code: [u8; 32] =
        out[32..].try_into().map_err(|_| CryptoError::KeyDerivation)?;

    for &index in path {
        let mut mac =
            HmacSha512::new_from_slice(&chain_code).map_err(|_| CryptoError::KeyDerivation)?;
        if index & HARDENED != 0 {
            mac.update(&[0u8]);
            mac.update(&key);
        } else {
            let parent = SigningKey::from_slice(&key).map_err(|_| CryptoError::KeyDerivation)?;
            let point = parent.verifying_key().to_encoded_point(true);
            mac.update(point.as_bytes());
        }
        mac.update(&index.to_be_bytes());
        let out = mac.finalize().into_bytes();
        let il: [u8; 32] = out[..32].try_into().map_err(|_| CryptoError::KeyDerivation)?;
        chain_code = out[32..].try_into().map_err(|_| CryptoError::KeyDerivation)?;
        key = scalar_add(&il, &key)?;
    }
    Ok(key)
}

/// `(IL + parent) mod n`, rejecting the zero scalar and IL ≥ n.
fn scalar_add(il: &[u8; 32], parent: &[u8; 32]) -> Result<[u8; 32], CryptoError> {
    let il_scalar =
        Option::<Scalar>::from(Scalar::from_repr((*il).into())).ok_or(CryptoError::KeyDerivation)?;
    let parent_scalar = Option::<Scalar>::from(Scalar::from_repr((*parent).into()))
        .ok_or(CryptoError::KeyDerivation)?;
    let child = il_scalar + parent_scalar;
    if bool::from(child.is_zero()) {
        return Err(CryptoError::KeyDerivation);
    }
    Ok(child.to_bytes().into())
}
