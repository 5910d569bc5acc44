use super::InclusionProof;

/// An error encountered when encoding a proof to bytes
#[derive(Debug, thiserror::Error)]
#[error("encode error: {0}")]
pub struct EncodeError(#[from] rmp_serde::encode::Error);

/// An error encountered when decoding a proof from bytes
#[derive(Debug, thiserror::Error)]
#[error("decode error: {0}")]
pub struct DecodeError(#[from] rmp_serde::decode::Error);

impl InclusionProof {
    /// Encode this proof as `MessagePack`
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Decode a proof encoded with [`InclusionProof::to_bytes`]
    ///
    /// The proof is not verified, call [`InclusionProof::verify`] for that
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` are not a valid encoded proof
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use crate::history;

    use super::*;

    #[test]
    fn proof_survives_byte_encoding() {
        let (tree, _ledger) = history! {
            "a" => 1u64,
            "b" => 2u64,
            "c" => 3u64,
        };

        let proof = tree.prove_value(tree.root(), "c").unwrap();
        let bytes = proof.to_bytes().unwrap();
        let decoded = InclusionProof::from_bytes(&bytes).unwrap();

        assert_eq!(decoded, proof);
        assert!(decoded.verify());
    }

    #[test]
    fn garbage_does_not_decode() {
        assert!(InclusionProof::from_bytes(&[0xc1, 0x00, 0x01]).is_err());
    }
}
