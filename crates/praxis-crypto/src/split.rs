//! Custody-share splitting for private keys.
//!
//! A private key is held as two shares: one PIN-encrypted on the client,
//! one stored plainly by the server. Either share alone is
//! information-theoretically useless; reconstruction needs both.
//!
//! The scheme is a 2-of-2 one-time pad: share 1 is uniformly random and
//! share 2 is the secret XORed against it. There is no threshold
//! generality here on purpose; until a >2-party requirement exists, the
//! pad keeps the security argument trivial.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{CryptoError, CryptoResult};
use crate::format::hex_bytes;

/// Number of shares in the custody scheme.
pub const CUSTODY_SHARES: u8 = 2;

/// One half of a split secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyShare {
    /// Share index, 1-based.
    pub index: u8,
    /// The share bytes, same length as the secret.
    #[serde(with = "hex_bytes")]
    pub payload: Vec<u8>,
}

impl CustodyShare {
    /// Encode the payload as hex for wire transport.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.payload)
    }

    /// Build a share from a hex-encoded payload.
    pub fn from_hex(index: u8, payload_hex: &str) -> CryptoResult<Self> {
        let payload = hex::decode(payload_hex)
            .map_err(|_| CryptoError::InvalidInput("share payload is not valid hex".into()))?;
        Ok(Self { index, payload })
    }
}

impl Drop for CustodyShare {
    fn drop(&mut self) {
        self.payload.zeroize();
    }
}

impl std::fmt::Debug for CustodyShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyShare")
            .field("index", &self.index)
            .field("payload", &"[REDACTED]")
            .finish()
    }
}

/// Split a secret into two custody shares.
///
/// Only `threshold = 2, total = 2` is supported; anything else is rejected
/// before touching the secret.
pub fn split(secret: &[u8], threshold: u8, total: u8) -> CryptoResult<Vec<CustodyShare>> {
    if threshold != CUSTODY_SHARES || total != CUSTODY_SHARES {
        return Err(CryptoError::InvalidInput(format!(
            "only 2-of-2 splitting is supported, got {}-of-{}",
            threshold, total
        )));
    }
    if secret.is_empty() {
        return Err(CryptoError::InvalidInput("cannot split an empty secret".into()));
    }

    let mut pad = vec![0u8; secret.len()];
    rand::thread_rng().fill_bytes(&mut pad);

    let masked: Vec<u8> = secret.iter().zip(pad.iter()).map(|(s, p)| s ^ p).collect();

    Ok(vec![
        CustodyShare {
            index: 1,
            payload: pad,
        },
        CustodyShare {
            index: 2,
            payload: masked,
        },
    ])
}

/// Reconstruct a secret from both custody shares.
///
/// Fails closed: fewer than two shares, duplicate indexes, or shares of
/// different lengths all yield `InsufficientShares` rather than a partial
/// secret.
pub fn reconstruct(shares: &[CustodyShare]) -> CryptoResult<Vec<u8>> {
    if shares.len() < CUSTODY_SHARES as usize {
        return Err(CryptoError::InsufficientShares);
    }

    let first = &shares[0];
    let second = shares
        .iter()
        .find(|s| s.index != first.index)
        .ok_or(CryptoError::InsufficientShares)?;

    if first.payload.len() != second.payload.len() || first.payload.is_empty() {
        return Err(CryptoError::InsufficientShares);
    }

    Ok(first
        .payload
        .iter()
        .zip(second.payload.iter())
        .map(|(a, b)| a ^ b)
        .collect())
}
