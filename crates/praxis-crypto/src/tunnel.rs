//! Tunnel key generation and multi-recipient distribution.
//!
//! A tunnel is the encrypted channel shared by one client and every staff
//! member allowed to see that client's appointments. Its 256-bit symmetric
//! key is generated once at registration and never stored in plaintext
//! server-side; instead it is independently re-encapsulated for each
//! recipient's KEM public key.
//!
//! Distribution is per-recipient fault-isolated: one bad staff key must
//! not stop the client or the remaining staff from receiving their grants.

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use praxis_core::defaults::AEAD_KEY_LEN;

use crate::cipher;
use crate::error::{CryptoError, CryptoResult};
use crate::format::{hex_bytes, WireEnvelope};
use crate::kem::{self, PrivateKey, PublicKey};

/// 256-bit symmetric tunnel key, zeroized on drop.
#[derive(Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct TunnelKey([u8; AEAD_KEY_LEN]);

impl TunnelKey {
    /// Generate a fresh random tunnel key.
    pub fn generate() -> Self {
        Self(cipher::generate_random())
    }

    /// Create a tunnel key from raw bytes, rejecting wrong lengths.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let key: [u8; AEAD_KEY_LEN] =
            bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
                expected: AEAD_KEY_LEN,
                actual: bytes.len(),
            })?;
        Ok(Self(key))
    }

    /// Get the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; AEAD_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for TunnelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// A distribution target: recipient id plus their raw KEM public key.
///
/// The key is carried as raw bytes and parsed per recipient, so one
/// malformed key surfaces as that recipient's failure instead of aborting
/// the whole call.
#[derive(Debug, Clone)]
pub struct Recipient {
    /// Staff or client identifier.
    pub id: String,
    /// ML-KEM-768 public key bytes.
    pub public_key: Vec<u8>,
}

/// One recipient's encrypted copy of the tunnel key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelGrant {
    /// Recipient this grant was encapsulated for.
    pub recipient_id: String,
    /// KEM encapsulated secret, hex on the wire.
    #[serde(with = "hex_bytes")]
    pub encapsulated: Vec<u8>,
    /// Tunnel key wrapped with AES-256-GCM under the KEM shared secret.
    pub wrapped_key: WireEnvelope,
}

/// A recipient the distributor could not serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionFailure {
    /// Recipient that failed.
    pub recipient_id: String,
    /// Why, suitable for operator logs (never shown to end users).
    pub reason: String,
}

/// Per-recipient outcome of a distribution call.
#[derive(Debug, Default)]
pub struct DistributionReport {
    /// Successfully issued grants.
    pub grants: Vec<TunnelGrant>,
    /// Recipients that could not be served.
    pub failures: Vec<DistributionFailure>,
}

impl DistributionReport {
    /// True when every recipient received a grant.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Collapse into all-or-nothing for callers that cannot tolerate a
    /// partial distribution.
    pub fn into_result(self) -> praxis_core::Result<Vec<TunnelGrant>> {
        if self.failures.is_empty() {
            Ok(self.grants)
        } else {
            Err(praxis_core::Error::PartialDistributionFailure {
                failed: self.failures.len(),
                total: self.failures.len() + self.grants.len(),
            })
        }
    }
}

/// Encrypt one tunnel key independently for every recipient.
///
/// Each recipient gets a fresh KEM encapsulation against their own public
/// key and the tunnel key wrapped under the resulting shared secret.
/// Failures are collected per recipient; the call itself only errors on an
/// empty recipient list.
pub fn distribute(key: &TunnelKey, recipients: &[Recipient]) -> CryptoResult<DistributionReport> {
    if recipients.is_empty() {
        return Err(CryptoError::InvalidInput(
            "at least one recipient required".into(),
        ));
    }

    let mut report = DistributionReport::default();

    for recipient in recipients {
        match grant_for(key, recipient) {
            Ok(grant) => report.grants.push(grant),
            Err(e) => report.failures.push(DistributionFailure {
                recipient_id: recipient.id.clone(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(report)
}

fn grant_for(key: &TunnelKey, recipient: &Recipient) -> CryptoResult<TunnelGrant> {
    let public = PublicKey::from_bytes(&recipient.public_key)?;
    let (shared_secret, encapsulated) = kem::encapsulate(&public)?;
    let wrapped = cipher::encrypt(key.as_bytes(), shared_secret.as_bytes())?;

    Ok(TunnelGrant {
        recipient_id: recipient.id.clone(),
        encapsulated,
        wrapped_key: WireEnvelope::from(&wrapped),
    })
}

/// Recipient-side: recover the tunnel key from a grant.
///
/// Decapsulation is implicit-rejection safe, so a grant that was not meant
/// for this private key fails here at AEAD verification, not earlier.
pub fn open_grant(grant: &TunnelGrant, private: &PrivateKey) -> CryptoResult<TunnelKey> {
    let shared_secret = kem::decapsulate(private, &grant.encapsulated)?;
    let envelope = grant.wrapped_key.decode()?;
    let key_bytes = cipher::decrypt(&envelope, shared_secret.as_bytes())?;
    TunnelKey::from_bytes(&key_bytes)
}
