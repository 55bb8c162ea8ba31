//! Structured logging schema and field name constants for praxis.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Rejected authentication, failed distribution entries |
//! | INFO  | Lifecycle events (session established, expired, logged out) |
//! | DEBUG | Decision points, state transitions, config choices |
//! | TRACE | Per-recipient distribution iteration |
//!
//! Key material, PINs, shares, and shared secrets are never logged at any
//! level. Secret-bearing types have redacted `Debug` impls.

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID for a custodian request/response pair.
/// Format: UUIDv7 (time-ordered).
pub const MESSAGE_ID: &str = "message_id";

/// Subsystem originating the log event.
/// Values: "crypto", "custody", "challenge", "api"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "authenticate", "decrypt_appointment", "distribute", "verify"
pub const OPERATION: &str = "op";

/// Claimant/client identity (the non-secret client id hash, never an email).
pub const CLIENT_ID: &str = "client_id";

/// Challenge UUID being issued or verified.
pub const CHALLENGE_ID: &str = "challenge_id";

/// Recipient identifier during tunnel key distribution.
pub const RECIPIENT_ID: &str = "recipient_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of recipients in a distribution call.
pub const RECIPIENT_COUNT: &str = "recipient_count";

/// Number of recipients that failed in a distribution call.
pub const FAILED_COUNT: &str = "failed_count";

/// Remaining seconds until session expiry.
pub const TTL_SECS: &str = "ttl_secs";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
