//! Error types for the praxis custody engine.

use thiserror::Error;

/// Result type alias using the praxis Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Workspace-level error taxonomy.
///
/// Authentication and decryption failures deliberately carry no detail
/// about *why* they failed (wrong PIN vs wrong share vs tampered data);
/// distinguishing them would hand an oracle to an attacker.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input rejected before any cryptographic work.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Authentication failed. Covers wrong PIN, wrong passkey, bad share,
    /// and AEAD tag mismatch; callers see one generic message.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// The time-boxed session credential has lapsed.
    #[error("Session expired")]
    SessionExpired,

    /// Secret reconstruction attempted with fewer than threshold shares.
    #[error("Insufficient shares for reconstruction")]
    InsufficientShares,

    /// Tunnel key could not be encapsulated for one or more recipients.
    #[error("Tunnel key distribution failed for {failed} of {total} recipients")]
    PartialDistributionFailure { failed: usize, total: usize },

    /// HTTP/network request to a custody collaborator failed.
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
