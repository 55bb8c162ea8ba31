//! Centralized default constants for the praxis custody engine.
//!
//! **This module is the single source of truth** for all shared default
//! values. The crypto and custody crates reference these constants instead
//! of defining their own magic numbers.

// =============================================================================
// KEM (ML-KEM-768)
// =============================================================================

/// Encapsulation (public) key size in bytes.
pub const KEM_PUBLIC_KEY_LEN: usize = 1184;

/// Decapsulation (private) key size in bytes.
pub const KEM_PRIVATE_KEY_LEN: usize = 2400;

/// KEM ciphertext (encapsulated secret) size in bytes.
pub const KEM_CIPHERTEXT_LEN: usize = 1088;

/// Shared secret size in bytes.
pub const KEM_SHARED_SECRET_LEN: usize = 32;

/// Deterministic keygen seed size in bytes (d || z, 32 + 32).
pub const KEM_SEED_LEN: usize = 64;

/// The only KEM parameter set this build accepts.
pub const KEM_PARAM_SET: &str = "ml-kem-768";

// =============================================================================
// AEAD (AES-256-GCM)
// =============================================================================

/// Symmetric key size in bytes (256 bits).
pub const AEAD_KEY_LEN: usize = 32;

/// IV/nonce size in bytes (96 bits).
pub const AEAD_IV_LEN: usize = 12;

/// Authentication tag size in bytes (128 bits).
pub const AEAD_TAG_LEN: usize = 16;

// =============================================================================
// PIN KEY STRETCHING (Argon2id)
// =============================================================================

/// Default Argon2id memory cost in KiB (64 MiB).
pub const PIN_KDF_MEMORY_KIB: u32 = 65536;

/// Default Argon2id time cost (passes).
pub const PIN_KDF_ITERATIONS: u32 = 10;

/// Default Argon2id parallelism (lanes).
pub const PIN_KDF_PARALLELISM: u32 = 1;

/// Default derived hash length in bytes.
pub const PIN_KDF_HASH_LENGTH: usize = 32;

/// Required PIN length (fixed-length numeric).
pub const PIN_LENGTH: usize = 6;

// =============================================================================
// SESSIONS
// =============================================================================

/// Sliding session-expiry window in seconds.
pub const SESSION_TTL_SECS: u64 = 600;

/// Capacity of the custodian request channel.
pub const CUSTODIAN_QUEUE_CAPACITY: usize = 32;

/// Capacity of the custodian event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 64;

// =============================================================================
// CHALLENGE-RESPONSE
// =============================================================================

/// Lifetime of an issued login challenge in seconds.
pub const CHALLENGE_TTL_SECS: u64 = 120;

// =============================================================================
// HTTP BOUNDARY
// =============================================================================

/// Timeout for custody API requests in seconds.
pub const API_TIMEOUT_SECS: u64 = 30;
