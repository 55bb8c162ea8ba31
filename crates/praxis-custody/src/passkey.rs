//! PIN-less key custody via the WebAuthn PRF extension.
//!
//! At enrollment the authenticator evaluates its PRF over a deterministic
//! per-identity salt and returns 32 bytes only that authenticator can
//! reproduce. The PRF output is expanded into the client-side custody
//! share; the server share is computed so both shares reconstruct the
//! account's 64-byte KEM seed. At login the same PRF evaluation plus the
//! server share rebuild the seed, and the seed rebuilds the key pair.
//!
//! The actual WebAuthn ceremony (credential creation, assertion, transport)
//! happens in the browser layer; this module only consumes its PRF output.

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use praxis_core::defaults::KEM_SEED_LEN;
use praxis_core::Result;
use praxis_crypto::error::{CryptoError, CryptoResult};
use praxis_crypto::kdf;
use praxis_crypto::kem::KeyPair;
use praxis_crypto::split::{self, CustodyShare};

/// Length of the PRF output the authenticator must return.
pub const PRF_OUTPUT_LEN: usize = 32;

const PRF_SALT_CONTEXT: &[u8] = b"praxis-passkey-prf-salt-v1";
const PRF_SHARE_INFO: &[u8] = b"praxis-passkey-share-v1";

/// Deterministic PRF evaluation salt for an identity.
///
/// Derived from the non-secret client id, so every login for the same
/// account evaluates the PRF over the same input and gets the same output.
pub fn prf_salt(email: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(PRF_SALT_CONTEXT);
    hasher.update(kdf::client_id(email).as_bytes());
    hasher.finalize().into()
}

/// Validate the authenticator's PRF output.
///
/// Exactly 32 bytes and not all zero; an authenticator that returns a
/// degenerate output must not silently custody a key.
pub fn validate_prf_output(prf_output: &[u8]) -> CryptoResult<[u8; PRF_OUTPUT_LEN]> {
    let bytes: [u8; PRF_OUTPUT_LEN] = prf_output.try_into().map_err(|_| {
        CryptoError::InvalidKeyMaterial(format!(
            "PRF output must be {} bytes, got {}",
            PRF_OUTPUT_LEN,
            prf_output.len()
        ))
    })?;
    if bytes.iter().all(|&b| b == 0) {
        return Err(CryptoError::InvalidKeyMaterial(
            "PRF output is all zero".into(),
        ));
    }
    Ok(bytes)
}

/// Expand the PRF output into the client-side custody share.
///
/// The expansion is deterministic, so the share never needs to be stored:
/// the authenticator re-derives it at every login.
fn prf_share(prf_output: &[u8; PRF_OUTPUT_LEN]) -> CryptoResult<CustodyShare> {
    let hkdf = Hkdf::<Sha256>::new(Some(PRF_SALT_CONTEXT), prf_output);
    let mut payload = vec![0u8; KEM_SEED_LEN];
    hkdf.expand(PRF_SHARE_INFO, &mut payload)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(CustodyShare { index: 1, payload })
}

/// Enroll a passkey: compute the server share for an account seed.
///
/// Returns the share the server stores. The client half is implicit in the
/// authenticator; nothing PIN- or PRF-derived is kept anywhere.
pub fn enroll(prf_output: &[u8], seed: &[u8; KEM_SEED_LEN]) -> Result<CustodyShare> {
    let prf = validate_prf_output(prf_output)?;
    let client_share = prf_share(&prf)?;

    // Server share = seed XOR client share, the pad scheme with a derived
    // pad instead of a random one.
    let payload: Vec<u8> = seed
        .iter()
        .zip(client_share.payload.iter())
        .map(|(s, p)| s ^ p)
        .collect();

    Ok(CustodyShare { index: 2, payload })
}

/// Reconstruct the account key pair from a fresh PRF evaluation and the
/// stored server share.
pub fn reconstruct_from_prf(prf_output: &[u8], server_share: &CustodyShare) -> Result<KeyPair> {
    let prf = validate_prf_output(prf_output)?;
    let client_share = prf_share(&prf)?;

    let seed_bytes = Zeroizing::new(split::reconstruct(&[client_share, server_share.clone()])?);
    let mut seed: [u8; KEM_SEED_LEN] = seed_bytes.as_slice().try_into().map_err(|_| {
        CryptoError::InvalidKeyMaterial(format!(
            "reconstructed seed must be {} bytes, got {}",
            KEM_SEED_LEN,
            seed_bytes.len()
        ))
    })?;
    let keypair = KeyPair::from_seed(&seed);
    seed.zeroize();

    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn fake_prf_output() -> [u8; PRF_OUTPUT_LEN] {
        let mut out = [0u8; PRF_OUTPUT_LEN];
        rand::thread_rng().fill_bytes(&mut out);
        out
    }

    fn fresh_seed() -> [u8; KEM_SEED_LEN] {
        let mut seed = [0u8; KEM_SEED_LEN];
        rand::thread_rng().fill_bytes(&mut seed);
        seed
    }

    #[test]
    fn enroll_then_reconstruct_yields_same_keypair() {
        let prf = fake_prf_output();
        let seed = fresh_seed();
        let expected = KeyPair::from_seed(&seed);

        let server_share = enroll(&prf, &seed).unwrap();
        let recovered = reconstruct_from_prf(&prf, &server_share).unwrap();

        assert_eq!(expected.public.as_bytes(), recovered.public.as_bytes());
        assert_eq!(expected.private.as_bytes(), recovered.private.as_bytes());
    }

    #[test]
    fn wrong_prf_output_yields_different_keypair() {
        let seed = fresh_seed();
        let expected = KeyPair::from_seed(&seed);

        let server_share = enroll(&fake_prf_output(), &seed).unwrap();
        let recovered = reconstruct_from_prf(&fake_prf_output(), &server_share).unwrap();

        assert_ne!(expected.public.as_bytes(), recovered.public.as_bytes());
    }

    #[test]
    fn server_share_alone_reveals_nothing_of_the_seed() {
        let seed = fresh_seed();
        let server_share = enroll(&fake_prf_output(), &seed).unwrap();
        assert_ne!(server_share.payload.as_slice(), seed.as_slice());
    }

    #[test]
    fn prf_output_must_be_32_bytes() {
        for bad in [0usize, 16, 31, 33, 64] {
            let err = validate_prf_output(&vec![1u8; bad]).unwrap_err();
            assert!(matches!(err, CryptoError::InvalidKeyMaterial(_)), "{bad}");
        }
    }

    #[test]
    fn all_zero_prf_output_is_rejected() {
        assert!(matches!(
            validate_prf_output(&[0u8; PRF_OUTPUT_LEN]),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn prf_salt_is_deterministic_per_identity() {
        assert_eq!(prf_salt("a@x.com"), prf_salt("  A@X.COM  "));
        assert_ne!(prf_salt("a@x.com"), prf_salt("b@x.com"));
    }

    #[test]
    fn enrollment_is_deterministic_given_prf_and_seed() {
        let prf = fake_prf_output();
        let seed = fresh_seed();
        let a = enroll(&prf, &seed).unwrap();
        let b = enroll(&prf, &seed).unwrap();
        assert_eq!(a.payload, b.payload);
    }
}
