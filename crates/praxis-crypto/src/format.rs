//! Wire encoding for envelopes and key material.
//!
//! Canonical layout: an [`EncryptedEnvelope`] crosses the wire as three
//! separate hex fields `{ ciphertext, iv, tag }` with a 12-byte IV. The
//! legacy `IV(16) ‖ TAG(16) ‖ ciphertext` concatenation is intentionally
//! not supported; every producer and consumer in the system uses this one
//! layout.

use serde::{Deserialize, Serialize};

use praxis_core::defaults::{AEAD_IV_LEN, AEAD_TAG_LEN};

use crate::cipher::EncryptedEnvelope;
use crate::error::{CryptoError, CryptoResult};

/// Serde form of an envelope: hex fields, fixed layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Hex-encoded ciphertext (tag excluded).
    pub ciphertext: String,
    /// Hex-encoded 12-byte IV.
    pub iv: String,
    /// Hex-encoded 16-byte authentication tag.
    pub tag: String,
}

impl From<&EncryptedEnvelope> for WireEnvelope {
    fn from(envelope: &EncryptedEnvelope) -> Self {
        Self {
            ciphertext: hex::encode(&envelope.ciphertext),
            iv: hex::encode(envelope.iv),
            tag: hex::encode(envelope.tag),
        }
    }
}

impl WireEnvelope {
    /// Decode back into an envelope, validating field sizes.
    ///
    /// A missing or mis-sized field is a hard failure; there is no partial
    /// envelope.
    pub fn decode(&self) -> CryptoResult<EncryptedEnvelope> {
        let ciphertext = decode_field(&self.ciphertext, "ciphertext")?;
        let iv_bytes = decode_field(&self.iv, "iv")?;
        let tag_bytes = decode_field(&self.tag, "tag")?;

        let iv: [u8; AEAD_IV_LEN] =
            iv_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: AEAD_IV_LEN,
                    actual: iv_bytes.len(),
                })?;
        let tag: [u8; AEAD_TAG_LEN] =
            tag_bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: AEAD_TAG_LEN,
                    actual: tag_bytes.len(),
                })?;

        Ok(EncryptedEnvelope {
            ciphertext,
            iv,
            tag,
        })
    }
}

fn decode_field(value: &str, field: &str) -> CryptoResult<Vec<u8>> {
    hex::decode(value)
        .map_err(|_| CryptoError::InvalidInput(format!("{} is not valid hex", field)))
}

/// Hex serialization helper for serde byte fields.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher;

    #[test]
    fn test_wire_roundtrip() {
        let key = [3u8; 32];
        let envelope = cipher::encrypt(b"appointment payload", &key).unwrap();

        let wire = WireEnvelope::from(&envelope);
        let decoded = wire.decode().unwrap();
        assert_eq!(decoded, envelope);

        let plaintext = cipher::decrypt(&decoded, &key).unwrap();
        assert_eq!(plaintext, b"appointment payload");
    }

    #[test]
    fn test_wire_json_shape() {
        let envelope = cipher::encrypt(b"x", &[0u8; 32]).unwrap();
        let json = serde_json::to_value(WireEnvelope::from(&envelope)).unwrap();

        assert!(json.get("ciphertext").is_some());
        assert_eq!(json["iv"].as_str().unwrap().len(), 24); // 12 bytes hex
        assert_eq!(json["tag"].as_str().unwrap().len(), 32); // 16 bytes hex
    }

    #[test]
    fn test_decode_rejects_bad_hex() {
        let wire = WireEnvelope {
            ciphertext: "zzzz".into(),
            iv: "00".repeat(12),
            tag: "00".repeat(16),
        };
        assert!(matches!(wire.decode(), Err(CryptoError::InvalidInput(_))));
    }

    #[test]
    fn test_decode_rejects_short_iv() {
        let wire = WireEnvelope {
            ciphertext: "00".into(),
            iv: "00".repeat(8),
            tag: "00".repeat(16),
        };
        assert!(matches!(
            wire.decode(),
            Err(CryptoError::InvalidKeyLength { expected: 12, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_legacy_16_byte_iv() {
        let wire = WireEnvelope {
            ciphertext: "00".into(),
            iv: "00".repeat(16),
            tag: "00".repeat(16),
        };
        assert!(wire.decode().is_err());
    }

    #[test]
    fn test_decode_rejects_short_tag() {
        let wire = WireEnvelope {
            ciphertext: "00".into(),
            iv: "00".repeat(12),
            tag: "00".repeat(4),
        };
        assert!(matches!(
            wire.decode(),
            Err(CryptoError::InvalidKeyLength { expected: 16, .. })
        ));
    }
}
