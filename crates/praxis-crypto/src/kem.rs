//! ML-KEM-768 key encapsulation engine.
//!
//! Wraps the RustCrypto `ml-kem` implementation behind fixed-size byte
//! wrappers so the rest of the workspace never touches the generic array
//! types. Key generation is either random (OS CSPRNG) or fully
//! deterministic from a 64-byte seed, which is what lets a PIN-derived
//! identity rebuild the same keypair on any device.
//!
//! # Implicit rejection
//!
//! `decapsulate` never reports a mismatch. A well-formed ciphertext that
//! was not produced for this key yields a pseudorandom-looking shared
//! secret; callers only detect the failure when the derived secret later
//! fails AEAD verification. Length errors are the one structural exception
//! and are rejected before any cryptographic work.

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{B32, Encoded, EncodedSizeUser, KemCore, MlKem768};
use zeroize::{Zeroize, ZeroizeOnDrop};

use praxis_core::defaults::{
    KEM_CIPHERTEXT_LEN, KEM_PRIVATE_KEY_LEN, KEM_PUBLIC_KEY_LEN, KEM_SEED_LEN,
    KEM_SHARED_SECRET_LEN,
};

use crate::error::{CryptoError, CryptoResult};

type Ek = <MlKem768 as KemCore>::EncapsulationKey;
type Dk = <MlKem768 as KemCore>::DecapsulationKey;

/// ML-KEM-768 encapsulation (public) key, 1184 bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Create a public key from raw bytes, rejecting wrong lengths.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEM_PUBLIC_KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEM_PUBLIC_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Get the raw bytes of the public key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn to_ml_kem(&self) -> CryptoResult<Ek> {
        let encoded: Encoded<Ek> =
            self.0
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEM_PUBLIC_KEY_LEN,
                    actual: self.0.len(),
                })?;
        Ok(Ek::from_bytes(&encoded))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

/// ML-KEM-768 decapsulation (private) key, 2400 bytes, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    /// Create a private key from raw bytes, rejecting wrong lengths.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != KEM_PRIVATE_KEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEM_PRIVATE_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Get the raw bytes of the private key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    fn to_ml_kem(&self) -> CryptoResult<Dk> {
        let encoded: Encoded<Dk> =
            self.0
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEM_PRIVATE_KEY_LEN,
                    actual: self.0.len(),
                })?;
        Ok(Dk::from_bytes(&encoded))
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// ML-KEM-768 keypair.
pub struct KeyPair {
    /// The encapsulation key (can be shared).
    pub public: PublicKey,
    /// The decapsulation key (must be kept secret).
    pub private: PrivateKey,
}

impl KeyPair {
    /// Generate a new random keypair using the OS CSPRNG.
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        let (dk, ek) = MlKem768::generate(&mut rng);
        Self {
            public: PublicKey(ek.as_bytes().to_vec()),
            private: PrivateKey(dk.as_bytes().to_vec()),
        }
    }

    /// Deterministically derive a keypair from a 64-byte seed (d || z).
    ///
    /// The same seed always yields a bit-identical keypair. This is the
    /// anchor for PIN-derived identities: the seed comes out of the PIN
    /// key-stretcher and the keypair is rebuilt at every login.
    pub fn from_seed(seed: &[u8; KEM_SEED_LEN]) -> Self {
        let mut d_bytes = [0u8; 32];
        let mut z_bytes = [0u8; 32];
        d_bytes.copy_from_slice(&seed[..32]);
        z_bytes.copy_from_slice(&seed[32..]);

        let d = B32::from(d_bytes);
        let z = B32::from(z_bytes);
        let (dk, ek) = MlKem768::generate_deterministic(&d, &z);

        d_bytes.zeroize();
        z_bytes.zeroize();

        Self {
            public: PublicKey(ek.as_bytes().to_vec()),
            private: PrivateKey(dk.as_bytes().to_vec()),
        }
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self {
            public: self.public.clone(),
            private: self.private.clone(),
        }
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("private", &"[REDACTED]")
            .finish()
    }
}

/// 32-byte KEM shared secret, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct SharedSecret([u8; KEM_SHARED_SECRET_LEN]);

impl SharedSecret {
    /// Get the raw bytes of the shared secret.
    pub fn as_bytes(&self) -> &[u8; KEM_SHARED_SECRET_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Encapsulate a fresh shared secret against a public key.
///
/// Each call draws fresh randomness: two encapsulations against the same
/// key never agree.
pub fn encapsulate(public: &PublicKey) -> CryptoResult<(SharedSecret, Vec<u8>)> {
    let ek = public.to_ml_kem()?;
    let mut rng = rand::rngs::OsRng;
    let (ct, ss) = ek
        .encapsulate(&mut rng)
        .map_err(|_| CryptoError::Encryption("ML-KEM encapsulation failed".into()))?;

    let mut secret = [0u8; KEM_SHARED_SECRET_LEN];
    secret.copy_from_slice(ss.as_ref());
    Ok((SharedSecret(secret), ct.to_vec()))
}

/// Decapsulate a shared secret from an encapsulated secret.
///
/// Wrong-length inputs fail fast; everything else succeeds, possibly with
/// an implicitly-rejected pseudorandom secret (see module docs).
pub fn decapsulate(private: &PrivateKey, encapsulated: &[u8]) -> CryptoResult<SharedSecret> {
    if encapsulated.len() != KEM_CIPHERTEXT_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: KEM_CIPHERTEXT_LEN,
            actual: encapsulated.len(),
        });
    }

    let dk = private.to_ml_kem()?;
    let ct: ml_kem::Ciphertext<MlKem768> =
        encapsulated
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: KEM_CIPHERTEXT_LEN,
                actual: encapsulated.len(),
            })?;

    let ss = dk
        .decapsulate(&ct)
        .map_err(|_| CryptoError::AuthenticationFailed)?;

    let mut secret = [0u8; KEM_SHARED_SECRET_LEN];
    secret.copy_from_slice(ss.as_ref());
    Ok(SharedSecret(secret))
}
