use serde::{de::Visitor, Deserializer, Serializer};
use serde::{Deserialize, Serialize};

use super::Digest;

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct V;
        impl Visitor<'_> for V {
            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a 0x-prefixed hex string representing a keccak-256 hash")
            }

            type Value = Digest;

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse().map_err(E::custom)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let bytes: [u8; 32] = v
                    .try_into()
                    .map_err(|_| E::custom(format!("incorrect number of bytes: {}", v.len())))?;

                Ok(Digest::from_bytes(bytes))
            }
        }

        deserializer.deserialize_str(V)
    }
}
