//! # praxis-core
//!
//! Shared foundations for the praxis key-custody workspace: the error
//! taxonomy, centralized default constants, the structured-logging field
//! schema, and environment-driven configuration.
//!
//! This crate contains no cryptography. The primitives live in
//! `praxis-crypto`; the stateful custody layer lives in `praxis-custody`.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;

pub use config::CustodyConfig;
pub use error::{Error, Result};
