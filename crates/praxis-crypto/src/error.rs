//! Error types for cryptographic operations.

use thiserror::Error;

/// Cryptographic operation errors.
///
/// The variants distinguish failure classes for tests and internal
/// handling; the custody layer collapses them into the generic
/// workspace-level taxonomy before anything reaches a user.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key or ciphertext material of the wrong length, rejected before any
    /// cryptographic work.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Malformed input (bad hex, unsupported split parameters, empty
    /// secret), rejected before any cryptographic work.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Key derivation failed.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// AEAD verification failed. Corruption and tampering are never
    /// distinguished.
    #[error("Authentication failed - data may be tampered")]
    AuthenticationFailed,

    /// Secret reconstruction attempted with fewer than threshold shares.
    #[error("Insufficient shares for reconstruction")]
    InsufficientShares,

    /// PRF output or other externally supplied key material failed
    /// validation.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

impl From<CryptoError> for praxis_core::Error {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidKeyLength { .. } | CryptoError::InvalidInput(_) => {
                praxis_core::Error::InvalidInput(e.to_string())
            }
            CryptoError::InsufficientShares => praxis_core::Error::InsufficientShares,
            // Everything downstream of key material collapses into one
            // generic failure so callers cannot tell PIN from share from
            // tag mismatch.
            CryptoError::KeyDerivation(_)
            | CryptoError::Encryption(_)
            | CryptoError::AuthenticationFailed
            | CryptoError::InvalidKeyMaterial(_) => praxis_core::Error::AuthenticationFailed,
        }
    }
}
