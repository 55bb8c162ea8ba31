//! Key stretching for PIN-derived identities.
//!
//! Two primitives, two jobs:
//!
//! - **Argon2id** stretches a low-entropy 6-digit PIN into high-entropy key
//!   material for wrapping the client-side custody share. Memory-hard, so
//!   offline guessing of the PIN space stays expensive.
//! - **HKDF-SHA-256** deterministically expands (email, PIN, server share)
//!   into the 64-byte seed for ML-KEM keygen. Cheap by design: its
//!   strength comes from the high-entropy server share in the input, not
//!   from stretching.
//!
//! Determinism is load-bearing here. The same inputs must reproduce the
//! same keypair on any device, or a client locks itself out of its own
//! appointment history.

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use praxis_core::defaults::{
    KEM_SEED_LEN, PIN_KDF_HASH_LENGTH, PIN_KDF_ITERATIONS, PIN_KDF_MEMORY_KIB,
    PIN_KDF_PARALLELISM,
};
use praxis_core::CustodyConfig;

use crate::error::{CryptoError, CryptoResult};

/// Domain separation for the salt pre-expansion.
const SALT_CONTEXT: &[u8] = b"praxis-pin-salt-v1";

/// Domain separation for the KEM seed expansion.
const KEM_SEED_INFO: &[u8] = b"praxis-kem-seed-v1";

/// Argon2id parameters for PIN stretching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinKdfParams {
    /// Memory in KiB (default: 65536 = 64 MiB).
    pub memory_kib: u32,
    /// Time iterations (default: 10).
    pub iterations: u32,
    /// Parallelism degree (default: 1).
    pub parallelism: u32,
    /// Output length in bytes (default: 32).
    pub hash_length: usize,
}

impl Default for PinKdfParams {
    fn default() -> Self {
        Self {
            memory_kib: PIN_KDF_MEMORY_KIB,
            iterations: PIN_KDF_ITERATIONS,
            parallelism: PIN_KDF_PARALLELISM,
            hash_length: PIN_KDF_HASH_LENGTH,
        }
    }
}

impl From<&CustodyConfig> for PinKdfParams {
    fn from(config: &CustodyConfig) -> Self {
        Self {
            memory_kib: config.pin_kdf_memory_kib,
            iterations: config.pin_kdf_iterations,
            parallelism: config.pin_kdf_parallelism,
            hash_length: config.pin_kdf_hash_length,
        }
    }
}

/// Stretched key material with automatic zeroization on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct StretchedKey(Vec<u8>);

impl StretchedKey {
    /// Get the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for StretchedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StretchedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive deterministic key material from a PIN via Argon2id.
///
/// The identity salt is pre-expanded through SHA-256 with a fixed context,
/// so an empty PIN or empty salt still derives a correctly-sized key
/// instead of tripping Argon2's minimum-salt rule. PIN *format* policy
/// (exactly six digits) is enforced by the session custodian, not here.
pub fn derive_key_from_pin(
    pin: &str,
    identity_salt: &str,
    params: &PinKdfParams,
) -> CryptoResult<StretchedKey> {
    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(params.hash_length),
    )
    .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

    let salt = Sha256::new()
        .chain_update(SALT_CONTEXT)
        .chain_update(identity_salt.as_bytes())
        .finalize();

    let mut key = vec![0u8; params.hash_length];
    argon2
        .hash_password_into(pin.as_bytes(), &salt, &mut key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(StretchedKey(key))
}

/// Derive the 64-byte deterministic ML-KEM seed from the login triple.
///
/// Input keying material is email ‖ PIN ‖ hex-decoded server share; the
/// HKDF salt is the client id, so two clients with the same PIN and share
/// bytes still diverge.
pub fn derive_kem_seed(
    email: &str,
    pin: &str,
    server_share_hex: &str,
) -> CryptoResult<[u8; KEM_SEED_LEN]> {
    let share = hex::decode(server_share_hex)
        .map_err(|_| CryptoError::InvalidInput("server share is not valid hex".into()))?;

    let normalized = normalize_email(email);
    let mut ikm = Vec::with_capacity(normalized.len() + pin.len() + share.len());
    ikm.extend_from_slice(normalized.as_bytes());
    ikm.extend_from_slice(pin.as_bytes());
    ikm.extend_from_slice(&share);

    let hkdf = Hkdf::<Sha256>::new(Some(client_id(email).as_bytes()), &ikm);
    let mut seed = [0u8; KEM_SEED_LEN];
    // Expand cannot fail for a 64-byte output with SHA-256.
    hkdf.expand(KEM_SEED_INFO, &mut seed)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    ikm.zeroize();

    Ok(seed)
}

/// Non-secret identity salt: SHA-256 of the lower-cased, trimmed email,
/// as a 64-hex-char string.
pub fn client_id(email: &str) -> String {
    let digest = Sha256::digest(normalize_email(email).as_bytes());
    hex::encode(digest)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small parameters so the test suite does not spend minutes in Argon2.
    fn fast_params() -> PinKdfParams {
        PinKdfParams {
            memory_kib: 1024,
            iterations: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }

    #[test]
    fn test_params_default() {
        let params = PinKdfParams::default();
        assert_eq!(params.memory_kib, 65536);
        assert_eq!(params.iterations, 10);
        assert_eq!(params.parallelism, 1);
        assert_eq!(params.hash_length, 32);
    }

    #[test]
    fn test_params_from_config() {
        let config = CustodyConfig::default();
        let params = PinKdfParams::from(&config);
        assert_eq!(params, PinKdfParams::default());
    }

    #[test]
    fn test_derive_key_deterministic() {
        let params = fast_params();
        let k1 = derive_key_from_pin("123456", "salt-a", &params).unwrap();
        let k2 = derive_key_from_pin("123456", "salt-a", &params).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_pin_changes_output() {
        let params = fast_params();
        let k1 = derive_key_from_pin("123456", "salt-a", &params).unwrap();
        let k2 = derive_key_from_pin("123457", "salt-a", &params).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_salt_changes_output() {
        let params = fast_params();
        let k1 = derive_key_from_pin("123456", "salt-a", &params).unwrap();
        let k2 = derive_key_from_pin("123456", "salt-b", &params).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_params_change_output() {
        let base = fast_params();
        let mut more_iterations = fast_params();
        more_iterations.iterations += 1;

        let k1 = derive_key_from_pin("123456", "salt", &base).unwrap();
        let k2 = derive_key_from_pin("123456", "salt", &more_iterations).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_empty_pin_and_salt_still_derive() {
        let params = fast_params();
        let key = derive_key_from_pin("", "", &params).unwrap();
        assert_eq!(key.as_bytes().len(), 32);

        // And deterministically so.
        let again = derive_key_from_pin("", "", &params).unwrap();
        assert_eq!(key.as_bytes(), again.as_bytes());
    }

    #[test]
    fn test_hash_length_honored() {
        let mut params = fast_params();
        params.hash_length = 64;
        let key = derive_key_from_pin("123456", "salt", &params).unwrap();
        assert_eq!(key.as_bytes().len(), 64);
    }

    #[test]
    fn test_kem_seed_deterministic() {
        let s1 = derive_kem_seed("a@b.com", "123456", "deadbeef").unwrap();
        let s2 = derive_kem_seed("a@b.com", "123456", "deadbeef").unwrap();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_kem_seed_inputs_independent() {
        let base = derive_kem_seed("a@b.com", "123456", "deadbeef").unwrap();
        assert_ne!(base, derive_kem_seed("c@d.com", "123456", "deadbeef").unwrap());
        assert_ne!(base, derive_kem_seed("a@b.com", "654321", "deadbeef").unwrap());
        assert_ne!(base, derive_kem_seed("a@b.com", "123456", "beefdead").unwrap());
    }

    #[test]
    fn test_kem_seed_email_normalized() {
        let s1 = derive_kem_seed("a@b.com", "123456", "00ff").unwrap();
        let s2 = derive_kem_seed("  A@B.COM  ", "123456", "00ff").unwrap();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_kem_seed_rejects_bad_hex() {
        let result = derive_kem_seed("a@b.com", "123456", "not-hex");
        assert!(matches!(result, Err(CryptoError::InvalidInput(_))));
    }

    #[test]
    fn test_client_id_shape() {
        let id = client_id("a@b.com");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_client_id_normalizes() {
        assert_eq!(client_id("a@b.com"), client_id("  A@B.Com "));
        assert_ne!(client_id("a@b.com"), client_id("b@a.com"));
    }

    #[test]
    fn test_stretched_key_debug_redacted() {
        let key = derive_key_from_pin("123456", "s", &fast_params()).unwrap();
        assert!(format!("{:?}", key).contains("REDACTED"));
    }
}
