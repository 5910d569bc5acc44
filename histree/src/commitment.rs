use serde::{Deserialize, Serialize};

use crate::hash::{hash_merge, value_digest, Digest, Hashable};

/// A hidden `(value, salt)` pair, as submitted to the ledger during the commit phase
///
/// The ledger only ever sees [`Commitment::digest`]. The value digest is what a voter later
/// reveals and proves inclusion for
///
/// ```rust
/// # use histree::{hash::{hash_merge, value_digest, Hashable}, Commitment};
/// let commitment = Commitment::new("a", 4u64);
///
/// assert_eq!(commitment.value(), value_digest("a"));
/// assert_eq!(commitment.salt(), 4u64.hash());
/// assert_eq!(commitment.digest(), hash_merge(value_digest("a"), 4u64.hash()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCommitment")]
pub struct Commitment {
    value: Digest,
    salt: Digest,
    digest: Digest,
}

/// A deserialized commitment whose digest is not `hash_merge(value, salt)`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("commitment digest {found} does not match its value and salt, expected {expected}")]
pub struct CommitmentMismatch {
    /// The digest computed from the value and salt
    pub expected: Digest,
    /// The digest that was given
    pub found: Digest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommitment {
    value: Digest,
    salt: Digest,
    digest: Digest,
}

impl TryFrom<RawCommitment> for Commitment {
    type Error = CommitmentMismatch;

    fn try_from(raw: RawCommitment) -> Result<Self, Self::Error> {
        let commitment = Self::from_digests(raw.value, raw.salt);

        if commitment.digest != raw.digest {
            return Err(CommitmentMismatch {
                expected: commitment.digest,
                found: raw.digest,
            });
        }

        Ok(commitment)
    }
}

impl Commitment {
    /// Commit to `value` with `salt`
    ///
    /// `value` is padded to a full word before hashing, see [`value_digest`]
    #[must_use]
    pub fn new(value: impl AsRef<[u8]>, salt: impl Hashable) -> Self {
        Self::from_digests(value_digest(value), salt.hash())
    }

    /// Build a commitment from an already-hashed value and salt
    #[must_use]
    pub fn from_digests(value: Digest, salt: Digest) -> Self {
        Self {
            value,
            salt,
            digest: hash_merge(value, salt),
        }
    }

    /// The digest of the padded value
    #[inline]
    #[must_use]
    pub fn value(&self) -> Digest {
        self.value
    }

    /// The digest of the salt
    #[inline]
    #[must_use]
    pub fn salt(&self) -> Digest {
        self.salt
    }

    /// The pair commitment, `hash_merge(value, salt)`
    #[inline]
    #[must_use]
    pub fn digest(&self) -> Digest {
        self.digest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_depends_on_both_halves() {
        let base = Commitment::new("a", 4u64);

        assert_ne!(base.digest(), Commitment::new("b", 4u64).digest());
        assert_ne!(base.digest(), Commitment::new("a", 5u64).digest());
        assert_eq!(base, Commitment::new(b"a", 4u64));
    }

    #[test]
    fn from_digests_matches_new() {
        let commitment = Commitment::new("c", 7u64);
        let rebuilt = Commitment::from_digests(commitment.value(), commitment.salt());

        assert_eq!(commitment, rebuilt);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let commitment = Commitment::new("a", "salt");
        let json = serde_json::to_value(commitment).unwrap();

        assert_eq!(json["value"], commitment.value().to_string());
        assert_eq!(json["salt"], commitment.salt().to_string());
        assert_eq!(json["digest"], commitment.digest().to_string());

        let back: Commitment = serde_json::from_value(json).unwrap();
        assert_eq!(back, commitment);
    }

    #[test]
    fn forged_digest_is_rejected() {
        let commitment = Commitment::new("a", 4u64);
        let mut json = serde_json::to_value(commitment).unwrap();
        json["digest"] = serde_json::json!(Digest::ZERO.to_string());

        let error = serde_json::from_value::<Commitment>(json).unwrap_err();
        assert!(error.to_string().contains(&commitment.digest().to_string()));
    }
}
