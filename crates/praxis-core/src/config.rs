//! Environment-driven configuration for the custody engine.
//!
//! Every tunable named in the deployment contract is readable from the
//! environment without code changes. Binaries load `.env` files via
//! `dotenvy` before calling [`CustodyConfig::from_env`].

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Runtime configuration for key stretching, sessions, and the KEM
/// parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyConfig {
    /// Argon2id memory cost in KiB.
    pub pin_kdf_memory_kib: u32,
    /// Argon2id time cost (passes).
    pub pin_kdf_iterations: u32,
    /// Argon2id parallelism (lanes).
    pub pin_kdf_parallelism: u32,
    /// Derived hash length in bytes.
    pub pin_kdf_hash_length: usize,
    /// Sliding session-expiry window in seconds.
    pub session_ttl_secs: u64,
    /// KEM parameter set identifier. Only "ml-kem-768" is accepted.
    pub kem_param_set: String,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            pin_kdf_memory_kib: defaults::PIN_KDF_MEMORY_KIB,
            pin_kdf_iterations: defaults::PIN_KDF_ITERATIONS,
            pin_kdf_parallelism: defaults::PIN_KDF_PARALLELISM,
            pin_kdf_hash_length: defaults::PIN_KDF_HASH_LENGTH,
            session_ttl_secs: defaults::SESSION_TTL_SECS,
            kem_param_set: defaults::KEM_PARAM_SET.to_string(),
        }
    }
}

impl CustodyConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `PRAXIS_PIN_KDF_MEMORY_KIB` | `65536` | Argon2id memory cost (KiB) |
    /// | `PRAXIS_PIN_KDF_ITERATIONS` | `10` | Argon2id time cost |
    /// | `PRAXIS_PIN_KDF_PARALLELISM` | `1` | Argon2id lanes |
    /// | `PRAXIS_PIN_KDF_HASH_LENGTH` | `32` | Derived key bytes |
    /// | `PRAXIS_SESSION_TTL_SECS` | `600` | Sliding expiry window |
    /// | `PRAXIS_KEM_PARAM_SET` | `ml-kem-768` | KEM parameter set |
    pub fn from_env() -> Result<Self> {
        let config = Self {
            pin_kdf_memory_kib: env_parse(
                "PRAXIS_PIN_KDF_MEMORY_KIB",
                defaults::PIN_KDF_MEMORY_KIB,
            ),
            pin_kdf_iterations: env_parse(
                "PRAXIS_PIN_KDF_ITERATIONS",
                defaults::PIN_KDF_ITERATIONS,
            ),
            pin_kdf_parallelism: env_parse(
                "PRAXIS_PIN_KDF_PARALLELISM",
                defaults::PIN_KDF_PARALLELISM,
            ),
            pin_kdf_hash_length: env_parse(
                "PRAXIS_PIN_KDF_HASH_LENGTH",
                defaults::PIN_KDF_HASH_LENGTH,
            ),
            session_ttl_secs: env_parse("PRAXIS_SESSION_TTL_SECS", defaults::SESSION_TTL_SECS),
            kem_param_set: std::env::var("PRAXIS_KEM_PARAM_SET")
                .unwrap_or_else(|_| defaults::KEM_PARAM_SET.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.kem_param_set != defaults::KEM_PARAM_SET {
            return Err(Error::Config(format!(
                "unsupported KEM parameter set: {} (expected {})",
                self.kem_param_set,
                defaults::KEM_PARAM_SET
            )));
        }
        if self.pin_kdf_hash_length < 4 {
            return Err(Error::Config(
                "PIN KDF hash length below Argon2 minimum of 4 bytes".into(),
            ));
        }
        if self.session_ttl_secs == 0 {
            return Err(Error::Config("session TTL must be non-zero".into()));
        }
        Ok(())
    }

    /// Set the sliding expiry window.
    pub fn with_session_ttl_secs(mut self, secs: u64) -> Self {
        self.session_ttl_secs = secs;
        self
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
