//! AES-256-GCM payload encryption.
//!
//! Every payload crossing the server is sealed into an
//! [`EncryptedEnvelope`]: ciphertext, a fresh 96-bit IV, and the 128-bit
//! authentication tag, always produced and consumed together. A missing or
//! mismatched field is a decryption failure, never a partial result.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use rand::RngCore;

use praxis_core::defaults::{AEAD_IV_LEN, AEAD_KEY_LEN, AEAD_TAG_LEN};

use crate::error::{CryptoError, CryptoResult};

/// Domain-separation associated data bound into every envelope.
const AEAD_CONTEXT: &[u8] = b"praxis-tunnel-aead-v1";

/// Ciphertext plus the IV and tag needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedEnvelope {
    /// AES-GCM ciphertext without the tag.
    pub ciphertext: Vec<u8>,
    /// 96-bit IV, unique per encryption under a given key.
    pub iv: [u8; AEAD_IV_LEN],
    /// 128-bit authentication tag.
    pub tag: [u8; AEAD_TAG_LEN],
}

/// Generate cryptographically secure random bytes.
pub fn generate_random<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn key_from_slice(key: &[u8]) -> CryptoResult<&[u8; AEAD_KEY_LEN]> {
    key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
        expected: AEAD_KEY_LEN,
        actual: key.len(),
    })
}

/// Encrypt plaintext with AES-256-GCM under a 32-byte key.
///
/// A fresh random IV is drawn per call. An IV must never repeat under the
/// same key, so there is deliberately no way to supply one.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> CryptoResult<EncryptedEnvelope> {
    let key = key_from_slice(key)?;
    let iv: [u8; AEAD_IV_LEN] = generate_random();

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut combined = cipher
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: plaintext,
                aad: AEAD_CONTEXT,
            },
        )
        .map_err(|_| CryptoError::Encryption("AES-GCM encryption failed".into()))?;

    // aes-gcm appends the tag; split it back out into the envelope.
    let tag_start = combined.len() - AEAD_TAG_LEN;
    let mut tag = [0u8; AEAD_TAG_LEN];
    tag.copy_from_slice(&combined[tag_start..]);
    combined.truncate(tag_start);

    Ok(EncryptedEnvelope {
        ciphertext: combined,
        iv,
        tag,
    })
}

/// Decrypt an envelope with AES-256-GCM under a 32-byte key.
///
/// The tag is verified before any plaintext is released; a mismatch yields
/// `AuthenticationFailed` with no hint of whether data was corrupted or
/// tampered with.
pub fn decrypt(envelope: &EncryptedEnvelope, key: &[u8]) -> CryptoResult<Vec<u8>> {
    let key = key_from_slice(key)?;

    let cipher =
        Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AuthenticationFailed)?;

    let mut combined = Vec::with_capacity(envelope.ciphertext.len() + AEAD_TAG_LEN);
    combined.extend_from_slice(&envelope.ciphertext);
    combined.extend_from_slice(&envelope.tag);

    cipher
        .decrypt(
            Nonce::from_slice(&envelope.iv),
            Payload {
                msg: &combined,
                aad: AEAD_CONTEXT,
            },
        )
        .map_err(|_| CryptoError::AuthenticationFailed)
}
