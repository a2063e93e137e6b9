//! EIP-155 legacy transaction construction and signing.
//!
//! The sighash covers `[nonce, gas_price, gas_limit, to, value, data,
//! chain_id, 0, 0]` — the chain id and two zero placeholders stand in for
//! the signature triple, which is what makes the signature replay-bound to
//! one chain. The serialized form replaces the placeholders with
//! `(v, r, s)` where `v = 35 + 2·chain_id + recovery_id`.

use crate::ecdsa::KeyPair;
use crate::errors::CryptoError;
use crate::hashing::keccak256;
use primitive_types::U256;
use rlp::{Rlp, RlpStream};

/// An unsigned legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    /// Recipient; `None` means contract creation.
    pub to: Option<[u8; 20]>,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    /// The EIP-155 signing digest.
    pub fn sighash(&self) -> [u8; 32] {
        let mut s = RlpStream::new_list(9);
        self.append_body(&mut s);
        s.append(&self.chain_id);
        s.append(&0u8);
        s.append(&0u8);
        keccak256(&s.out())
    }

    /// Sign with RFC-6979 and produce the wire-ready payload.
    pub fn sign(&self, key: &KeyPair) -> Result<SignedTransaction, CryptoError> {
        let digest = self.sighash();
        let sig = key.sign_prehash(&digest)?;
        let v = eip155_v(self.chain_id, sig.recovery_id);
        let r = U256::from_big_endian(&sig.r);
        let s = U256::from_big_endian(&sig.s);

        let mut stream = RlpStream::new_list(9);
        self.append_body(&mut stream);
        stream.append(&v);
        stream.append(&r);
        stream.append(&s);
        let raw = stream.out().to_vec();
        let hash = keccak256(&raw);
        Ok(SignedTransaction { v, r, s, raw, hash })
    }

    fn append_body(&self, s: &mut RlpStream) {
        s.append(&self.nonce);
        s.append(&self.gas_price);
        s.append(&self.gas_limit);
        match &self.to {
            Some(addr) => s.append(&addr.to_vec()),
            None => s.append(&Vec::<u8>::new()),
        };
        s.append(&self.value);
        s.append(&self.data);
    }
}

/// `v = 35 + 2·chain_id + recovery_id`.
pub fn eip155_v(chain_id: u64, recovery_id: u8) -> u64 {
    35 + 2 * chain_id + recovery_id as u64
}

/// A signed transaction ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub v: u64,
    pub r: U256,
    pub s: U256,
    raw: Vec<u8>,
    hash: [u8; 32],
}

impl SignedTransaction {
    /// The RLP byte string submitted to the node.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// `keccak256` of the raw payload — the transaction id.
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Decode a raw signed payload back into its parts.
    pub fn decode(raw: &[u8]) -> Result<(LegacyTransaction, u64, U256, U256), CryptoError> {
        let rlp = Rlp::new(raw);
        if !rlp.is_list() || rlp.item_count()? != 9 {
            return Err(CryptoError::Rlp("expected 9-element list".into()));
        }
        let to_bytes: Vec<u8> = rlp.val_at(3)?;
        let to = match to_bytes.len() {
            0 => None,
            20 => {
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&to_bytes);
                Some(addr)
            }
            n => return Err(CryptoError::Rlp(format!("recipient of {n} bytes"))),
        };
        let v: u64 = rlp.val_at(6)?;
        let chain_id = if v >= 35 { (v - 35) / 2 } else { 0 };
        let tx = LegacyTransaction {
            nonce: rlp.val_at(0)?,
            gas_price: rlp.val_at(1)?,
            gas_limit: rlp.val_at(2)?,
            to,
            value: rlp.val_at(4)?,
            data: rlp.val_at(5)?,
            chain_id,
        };
        Ok((tx, v, rlp.val_at(7)?, rlp.val_at(8)?))
    }
}
