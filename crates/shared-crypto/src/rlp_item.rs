//! Recursive length-prefix codec over the item union `Bytes | List`.
//!
//! Encoding rules: a single byte below `0x80` is its own encoding; short
//! byte strings prefix `0x80 + len`; long strings prefix
//! `0xb7 + len-of-len` then the length; lists are analogous at
//! `0xc0`/`0xf7`. Integers are big-endian with no leading zeros and zero
//! is the empty string.

use primitive_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

/// A well-formed RLP item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    /// An unsigned integer as its canonical minimal byte string.
    pub fn uint(value: U256) -> Self {
        if value.is_zero() {
            return RlpItem::Bytes(Vec::new());
        }
        let mut buf = [0u8; 32];
        value.to_big_endian(&mut buf);
        let skip = buf.iter().take_while(|b| **b == 0).count();
        RlpItem::Bytes(buf[skip..].to_vec())
    }

    pub fn str(value: &str) -> Self {
        RlpItem::Bytes(value.as_bytes().to_vec())
    }

    pub fn encode(&self) -> Vec<u8> {
        rlp::encode(self).to_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecoderError> {
        let rlp = Rlp::new(bytes);
        // Reject trailing garbage: the payload must be exactly one item.
        let info = rlp.payload_info()?;
        if info.header_len + info.value_len != bytes.len() {
            return Err(DecoderError::RlpIsTooBig);
        }
        Self::decode_rlp(&rlp)
    }

    fn decode_rlp(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        if rlp.is_list() {
            let mut items = Vec::with_capacity(rlp.item_count()?);
            for i in 0..rlp.item_count()? {
                items.push(Self::decode_rlp(&rlp.at(i)?)?);
            }
            Ok(RlpItem::List(items))
        } else {
            Ok(RlpItem::Bytes(rlp.data()?.to_vec()))
        }
    }
}

impl Encodable for RlpItem {
    fn rlp_append(&self, s: &mut RlpStream) {
        match self {
            RlpItem::Bytes(bytes) => {
                s.append(bytes);
            }
            RlpItem::List(items) => {
                s.begin_list(items.len());
                for item in items {
                    s.append(item);
                }
            }
        }
    }
}

impl Decodable for RlpItem {
    fn decode(rlp: &Rlp<'_>) -> Result<Self, DecoderError> {
        Self::decode_rlp(rlp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_encodes_as_itself() {
        assert_eq!(RlpItem::Bytes(vec![0x7f]).encode(), vec![0x7f]);
        assert_eq!(RlpItem::Bytes(vec![0x00]).encode(), vec![0x00]);
    }

    #[test]
    fn short_string() {
        // "dog" -> [0x83, 'd', 'o', 'g']
        assert_eq!(RlpItem::str("dog").encode(), vec![0x83, b'd', b'o', b'g']);
    }

    #[test]
    fn empty_string_and_list() {
        assert_eq!(RlpItem::Bytes(Vec::new()).encode(), vec![0x80]);
        assert_eq!(RlpItem::List(Vec::new()).encode(), vec![0xc0]);
    }

    #[test]
    fn long_string_prefix() {
        // 56 bytes crosses into the 0xb7 + len-of-len form.
        let item = RlpItem::Bytes(vec![b'a'; 56]);
        let encoded = item.encode();
        assert_eq!(encoded[0], 0xb8);
        assert_eq!(encoded[1], 56);
        assert_eq!(encoded.len(), 58);
    }

    #[test]
    fn nested_list() {
        // [ [], [[]], [ [], [[]] ] ] — the set-theoretic representation of 3.
        let item = RlpItem::List(vec![
            RlpItem::List(vec![]),
            RlpItem::List(vec![RlpItem::List(vec![])]),
            RlpItem::List(vec![
                RlpItem::List(vec![]),
                RlpItem::List(vec![RlpItem::List(vec![])]),
            ]),
        ]);
        assert_eq!(
            item.encode(),
            vec![0xc7, 0xc0, 0xc1, 0xc0, 0xc3, 0xc0, 0xc1, 0xc0]
        );
        assert_eq!(RlpItem::decode(&item.encode()).unwrap(), item);
    }

    #[test]
    fn integers_are_minimal_big_endian() {
        assert_eq!(RlpItem::uint(U256::zero()).encode(), vec![0x80]);
        assert_eq!(RlpItem::uint(U256::from(15u64)).encode(), vec![0x0f]);
        assert_eq!(
            RlpItem::uint(U256::from(1024u64)).encode(),
            vec![0x82, 0x04, 0x00]
        );
    }

    #[test]
    fn roundtrip_mixed_items() {
        let items = [
            RlpItem::Bytes(vec![]),
            RlpItem::Bytes(vec![0x01]),
            RlpItem::str("Lorem ipsum dolor sit amet, consectetur adipisicing elit"),
            RlpItem::List(vec![
                RlpItem::str("cat"),
                RlpItem::str("dog"),
                RlpItem::uint(U256::from(0xdeadbeefu64)),
            ]),
            RlpItem::List(vec![RlpItem::Bytes(vec![0xff; 300])]),
        ];
        for item in items {
            assert_eq!(RlpItem::decode(&item.encode()).unwrap(), item);
        }
    }

    #[test]
    fn rejects_truncated_input() {
        let encoded = RlpItem::str("dog").encode();
        assert!(RlpItem::decode(&encoded[..2]).is_err());
    }
}
