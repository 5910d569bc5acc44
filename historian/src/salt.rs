#![allow(clippy::assign_op_pattern)]

use histree::hash::{Digest, Hashable};
use uint::construct_uint;

use crate::errors::{self, AppError};

construct_uint! {
    /// 256-bit unsigned integer.
    struct U256(4);
}

/// How a salt given on the command line is hashed
///
/// Decimal numbers hash as 256-bit words (negative numbers as two's complement) and `0x`-prefixed
/// strings as the bytes they encode, the same way the ledger's client library would hash them.
/// Anything else hashes as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Salt {
    Word([u8; 32]),
    Bytes(Vec<u8>),
    Text(String),
}

impl Salt {
    pub(crate) fn parse(salt: &str) -> errors::Result<Self> {
        if let Some(hex) = salt.strip_prefix("0x") {
            return Ok(Self::Bytes(hex::decode(hex)?));
        }

        let (negative, digits) = match salt.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, salt),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(Self::Text(salt.to_string()));
        }

        let out_of_range = || AppError::SaltOutOfRange(salt.to_string());
        let magnitude = U256::from_dec_str(digits).map_err(|_| out_of_range())?;

        let word = if negative {
            if magnitude > U256::one() << 255 {
                return Err(out_of_range());
            }
            (!magnitude).overflowing_add(U256::one()).0
        } else {
            magnitude
        };

        let mut bytes = [0u8; 32];
        word.to_big_endian(&mut bytes);

        Ok(Self::Word(bytes))
    }
}

impl Hashable for Salt {
    fn hash(&self) -> Digest {
        match self {
            Self::Word(word) => word.hash(),
            Self::Bytes(bytes) => bytes.hash(),
            Self::Text(text) => text.hash(),
        }
    }
}
