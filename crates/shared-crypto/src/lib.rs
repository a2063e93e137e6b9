//! # Shared Crypto
//!
//! The cryptographic core of the adapter:
//!
//! - Keccak-256 (pre-NIST Keccak, not SHA3-256) with a variadic helper.
//! - Recoverable secp256k1 ECDSA with RFC-6979 deterministic nonces and
//!   low-s normalization. Signing the same digest with the same key is
//!   bit-identical across runs.
//! - The EVM address codec: key → address derivation and the mixed-case
//!   checksum string form.
//! - An RLP codec over the `Bytes | List` item union.
//! - The EIP-155 legacy transaction builder/signer. The signed-transaction
//!   byte string and the checksum encoding are the two bit-exact wire
//!   contracts of the whole service; both carry known-vector tests.
//! - BIP-39/BIP-44 mnemonic key derivation over `m/44'/60'/0'/0/0`.

pub mod address;
pub mod ecdsa;
pub mod errors;
pub mod hashing;
pub mod mnemonic;
pub mod rlp_item;
pub mod transaction;

pub use address::EthAddressCodec;
pub use ecdsa::{KeyPair, RecoverableSignature};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_concat};
pub use mnemonic::MnemonicKey;
pub use rlp_item::RlpItem;
pub use transaction::{LegacyTransaction, SignedTransaction};
