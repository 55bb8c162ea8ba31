//! Session custody and authentication for praxis.
//!
//! Builds the client-visible custody layer on top of `praxis-crypto`:
//!
//! - [`credential`] — the synchronous session state machine with sliding
//!   expiry and wipe-on-exit.
//! - [`custodian`] — the actor form: the state machine isolated in its own
//!   tokio task behind a message-passing handle.
//! - [`challenge`] — KEM challenge-response login, constant-time verified.
//! - [`passkey`] — PIN-less key reconstruction from a WebAuthn PRF output.
//! - [`api`] — the `CustodyApi` boundary to the (zero-knowledge) server.
//!
//! The invariant the whole crate exists to hold: a decrypted appointment
//! and the key pair that decrypted it live only inside the custodian task,
//! only while a session is live.
//!
//! # Example
//!
//! ```no_run
//! use praxis_core::CustodyConfig;
//! use praxis_custody::custodian;
//!
//! # async fn demo() -> praxis_core::Result<()> {
//! let handle = custodian::spawn(CustodyConfig::default());
//! handle.authenticate("client@example.com", "483920", "aa55aa55").await?;
//! let status = handle.status().await?;
//! println!("session: {:?}", status.state);
//! handle.logout().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod challenge;
pub mod credential;
pub mod custodian;
pub mod passkey;

pub use api::{CustodyApi, HttpCustodyApi, InMemoryCustodyApi};
pub use challenge::{ChallengeDesk, ChallengeOutcome, IssuedChallenge};
pub use credential::{Custodian, SessionState, SessionStatus};
pub use custodian::{spawn, CustodianEvent, CustodianHandle, CustodianRequest, CustodianResponse};
