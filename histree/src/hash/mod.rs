//! Items relating to hashing data
//!
//! In particular, the [`Digest`] type, the [`Hashable`] trait, and the two combination rules the
//! ledger uses to grow its tree: [`hash_single`] (self-promotion) and [`hash_merge`] (pairing)

use std::{
    fmt::{Debug, Display},
    str::FromStr,
};

use sha3::{Digest as _, Keccak256};

mod hashable;
pub use hashable::{value_digest, Hashable};
#[cfg(any(test, feature = "proptest"))]
mod proptest_impls;
mod serde_impls;

/// A Keccak-256 digest
///
/// Digests are totally ordered so they can key the node table, but the ordering carries no
/// meaning beyond that
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; 32]);

impl Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash({self})")
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Digest {
    /// The all-zero digest
    ///
    /// This is the root the ledger reports before anything has been appended
    ///
    /// ```rust
    /// # use histree::{hash::Digest, HistoryTree};
    /// let tree = HistoryTree::new();
    /// assert_eq!(tree.root(), Digest::ZERO);
    /// ```
    pub const ZERO: Digest = Digest([0; 32]);

    /// The length of this hash in bytes
    pub const LEN: usize = 32;

    /// Create a [`Digest`] from its raw bytes
    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Get the representation of this hash as a byte array
    #[inline]
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.0
    }

    /// Borrow the raw bytes of this hash
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Calculate the Keccak-256 hash of the given bytes
    #[inline]
    #[must_use]
    pub fn calculate(bytes: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(bytes);
        Self::from_hasher(hasher)
    }

    fn from_hasher(hasher: Keccak256) -> Self {
        let mut out = [0u8; Self::LEN];
        out.copy_from_slice(&hasher.finalize());
        Self(out)
    }
}

impl From<[u8; 32]> for Digest {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// An error encountered when parsing a [`Digest`] from hex
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseDigestError {
    /// The input was not valid hex
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The input decoded to the wrong number of bytes
    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

impl FromStr for Digest {
    type Err = ParseDigestError;

    /// Parse a hex digest, with or without a leading `0x`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        let bytes = hex::decode(s)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ParseDigestError::Length(bytes.len()))?;

        Ok(Self(bytes))
    }
}

/// Hash a single digest on its own
///
/// This is the self-promotion rule: a node that reaches a level with no waiting sibling is
/// wrapped as `keccak(node)` so that it stays aligned with its dyadic block
#[inline]
#[must_use]
pub fn hash_single(digest: Digest) -> Digest {
    Digest::calculate(digest.as_bytes())
}

/// Hash two digests together
///
/// This is the pairing rule, `parent = keccak(left ‖ right)`. The earlier subtree always goes on
/// the left
///
/// This operation is not symmetric:
/// ```rust
/// # use histree::hash::{hash_merge, Digest};
/// let a = Digest::calculate(b"a");
/// let b = Digest::calculate(b"b");
///
/// assert_ne!(hash_merge(a, b), hash_merge(b, a));
/// ```
#[inline]
#[must_use]
pub fn hash_merge(left: Digest, right: Digest) -> Digest {
    let mut hasher = Keccak256::new();
    hasher.update(left.0);
    hasher.update(right.0);
    Digest::from_hasher(hasher)
}

#[cfg(test)]
mod tests {
    use proptest::prop_assert_eq;
    use test_strategy::proptest;

    use super::*;

    #[test]
    fn zero_is_all_zeroes() {
        assert_eq!(Digest::ZERO.to_bytes(), [0; 32]);
        assert_eq!(Digest::default(), Digest::ZERO);
    }

    #[test]
    fn keccak_known_vectors() {
        assert_eq!(
            Digest::calculate(b"").to_string(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            Digest::calculate(b"abc").to_string(),
            "0x4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn merge_is_hash_of_concatenation() {
        let a = Digest::calculate(b"left");
        let b = Digest::calculate(b"right");

        let mut bytes = a.to_bytes().to_vec();
        bytes.extend_from_slice(b.as_bytes());

        assert_eq!(hash_merge(a, b), Digest::calculate(&bytes));
    }

    #[test]
    fn single_is_hash_of_bytes() {
        let a = Digest::calculate(b"a");
        assert_eq!(hash_single(a), Digest::calculate(a.as_bytes()));
        assert_ne!(hash_single(a), a);
    }

    #[test]
    fn parse_accepts_optional_prefix() {
        let digest = Digest::calculate(b"abc");
        let hex = digest.to_string();

        assert_eq!(hex.parse::<Digest>().unwrap(), digest);
        assert_eq!(hex[2..].parse::<Digest>().unwrap(), digest);
        assert_eq!(
            "0x1234".parse::<Digest>(),
            Err(ParseDigestError::Length(2))
        );
        assert!(matches!(
            "0xzz".parse::<Digest>(),
            Err(ParseDigestError::Hex(_))
        ));
    }

    #[test]
    fn debug_wraps_hex() {
        assert_eq!(
            format!("{:?}", Digest::ZERO),
            format!("Hash(0x{})", "00".repeat(32))
        );
    }

    #[proptest]
    fn digest_display_parse_round_trip(digest: Digest) {
        let digest_again: Digest = digest.to_string().parse().unwrap();

        prop_assert_eq!(digest, digest_again);
    }
}
