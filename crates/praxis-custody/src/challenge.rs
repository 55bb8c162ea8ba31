//! Challenge-response login verification.
//!
//! The desk proves possession of a KEM private key without ever seeing it:
//! it encapsulates a fresh secret against the claimant's registered public
//! key, remembers the expected 32 bytes, and later compares the claimant's
//! decapsulated response in constant time. A wrong PIN, a wrong share, a
//! stale challenge, and an unknown challenge id all produce the same
//! rejection.

use std::collections::HashMap;

use subtle::ConstantTimeEq;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroize;

use praxis_core::{defaults, Result};
use praxis_crypto::format::hex_bytes;
use praxis_crypto::kem::{self, PublicKey};

/// What a claimant receives: an opaque blob only the right private key can
/// decapsulate.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IssuedChallenge {
    pub challenge_id: Uuid,
    /// ML-KEM encapsulated secret, hex on the wire.
    #[serde(with = "hex_bytes")]
    pub encapsulated: Vec<u8>,
}

/// Terminal outcome of a verification attempt.
///
/// Deliberately carries no detail: the claimant learns pass or fail and
/// nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Verified,
    Rejected,
}

/// Called with the claimant id on every rejected attempt. Rate limiting
/// and lockout policy live behind this hook, outside the desk.
pub type AttemptObserver = Box<dyn Fn(&str) + Send + Sync>;

struct Expectation {
    claimant_id: String,
    expected: [u8; 32],
    expires_at: Instant,
}

impl Drop for Expectation {
    fn drop(&mut self) {
        self.expected.zeroize();
    }
}

/// Server-side desk of outstanding challenges.
///
/// Each challenge is single-use: verification consumes the expectation
/// whatever the outcome, so a response can never be replayed and a failed
/// attempt requires a fresh challenge.
pub struct ChallengeDesk {
    pending: HashMap<Uuid, Expectation>,
    ttl: Duration,
    observer: Option<AttemptObserver>,
}

impl ChallengeDesk {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
            ttl: Duration::from_secs(defaults::CHALLENGE_TTL_SECS),
            observer: None,
        }
    }

    /// Override the challenge lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Install the failed-attempt hook.
    pub fn with_observer(mut self, observer: AttemptObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Issue a challenge against the claimant's registered public key.
    pub fn issue(&mut self, claimant_id: &str, public: &PublicKey) -> Result<IssuedChallenge> {
        let (secret, encapsulated) = kem::encapsulate(public)?;
        let challenge_id = Uuid::now_v7();

        self.pending.insert(
            challenge_id,
            Expectation {
                claimant_id: claimant_id.to_string(),
                expected: *secret.as_bytes(),
                expires_at: Instant::now() + self.ttl,
            },
        );

        debug!(%challenge_id, claimant_id, "Challenge issued");
        Ok(IssuedChallenge {
            challenge_id,
            encapsulated,
        })
    }

    /// Verify a response, consuming the challenge.
    ///
    /// The comparison over the 32-byte response is constant-time; every
    /// failure path collapses into the same [`ChallengeOutcome::Rejected`].
    pub fn verify(&mut self, challenge_id: Uuid, response: &[u8]) -> ChallengeOutcome {
        // Consumed up front: a second attempt against the same id fails
        // even if the first one was correct.
        let Some(expectation) = self.pending.remove(&challenge_id) else {
            warn!(%challenge_id, "Verification against unknown challenge");
            return ChallengeOutcome::Rejected;
        };

        let fresh = Instant::now() < expectation.expires_at;
        let matches = response.len() == expectation.expected.len()
            && bool::from(expectation.expected.ct_eq(response));

        if fresh && matches {
            info!(%challenge_id, claimant_id = %expectation.claimant_id, "Challenge verified");
            ChallengeOutcome::Verified
        } else {
            warn!(%challenge_id, claimant_id = %expectation.claimant_id, "Challenge rejected");
            if let Some(observer) = &self.observer {
                observer(&expectation.claimant_id);
            }
            ChallengeOutcome::Rejected
        }
    }

    /// Drop every expired expectation. Verification already rejects stale
    /// challenges; this just bounds the map.
    pub fn sweep(&mut self) {
        let now = Instant::now();
        self.pending.retain(|_, e| now < e.expires_at);
    }

    /// Number of outstanding challenges.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }
}

impl Default for ChallengeDesk {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_crypto::kem::KeyPair;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn respond(keypair: &KeyPair, challenge: &IssuedChallenge) -> [u8; 32] {
        *kem::decapsulate(&keypair.private, &challenge.encapsulated)
            .unwrap()
            .as_bytes()
    }

    #[test]
    fn correct_response_verifies() {
        let keypair = KeyPair::generate();
        let mut desk = ChallengeDesk::new();
        let challenge = desk.issue("client-1", &keypair.public).unwrap();
        let response = respond(&keypair, &challenge);
        assert_eq!(
            desk.verify(challenge.challenge_id, &response),
            ChallengeOutcome::Verified
        );
    }

    #[test]
    fn wrong_key_is_rejected() {
        let registered = KeyPair::generate();
        let imposter = KeyPair::generate();
        let mut desk = ChallengeDesk::new();
        let challenge = desk.issue("client-1", &registered.public).unwrap();
        // Implicit rejection: the imposter gets a well-formed but wrong
        // 32-byte response.
        let response = respond(&imposter, &challenge);
        assert_eq!(
            desk.verify(challenge.challenge_id, &response),
            ChallengeOutcome::Rejected
        );
    }

    #[test]
    fn challenge_is_single_use() {
        let keypair = KeyPair::generate();
        let mut desk = ChallengeDesk::new();
        let challenge = desk.issue("client-1", &keypair.public).unwrap();
        let response = respond(&keypair, &challenge);
        assert_eq!(
            desk.verify(challenge.challenge_id, &response),
            ChallengeOutcome::Verified
        );
        // Replay of the identical correct response.
        assert_eq!(
            desk.verify(challenge.challenge_id, &response),
            ChallengeOutcome::Rejected
        );
    }

    #[test]
    fn unknown_challenge_is_rejected() {
        let mut desk = ChallengeDesk::new();
        assert_eq!(
            desk.verify(Uuid::now_v7(), &[0u8; 32]),
            ChallengeOutcome::Rejected
        );
    }

    #[test]
    fn wrong_length_response_is_rejected() {
        let keypair = KeyPair::generate();
        let mut desk = ChallengeDesk::new();
        let challenge = desk.issue("client-1", &keypair.public).unwrap();
        assert_eq!(
            desk.verify(challenge.challenge_id, &[0u8; 16]),
            ChallengeOutcome::Rejected
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_challenge_is_rejected() {
        let keypair = KeyPair::generate();
        let mut desk = ChallengeDesk::new().with_ttl(Duration::from_secs(120));
        let challenge = desk.issue("client-1", &keypair.public).unwrap();
        let response = respond(&keypair, &challenge);

        tokio::time::advance(Duration::from_secs(121)).await;

        assert_eq!(
            desk.verify(challenge.challenge_id, &response),
            ChallengeOutcome::Rejected
        );
    }

    #[test]
    fn observer_fires_only_on_rejection() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let keypair = KeyPair::generate();
        let mut desk = ChallengeDesk::new().with_observer(Box::new(move |claimant| {
            assert_eq!(claimant, "client-1");
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        let challenge = desk.issue("client-1", &keypair.public).unwrap();
        let response = respond(&keypair, &challenge);
        desk.verify(challenge.challenge_id, &response);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        let challenge = desk.issue("client-1", &keypair.public).unwrap();
        desk.verify(challenge.challenge_id, &[0u8; 32]);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_expired_challenges() {
        let keypair = KeyPair::generate();
        let mut desk = ChallengeDesk::new().with_ttl(Duration::from_secs(60));
        desk.issue("a", &keypair.public).unwrap();
        desk.issue("b", &keypair.public).unwrap();
        assert_eq!(desk.outstanding(), 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        desk.sweep();
        assert_eq!(desk.outstanding(), 0);
    }

    #[test]
    fn issued_challenge_serializes_with_hex_payload() {
        let keypair = KeyPair::generate();
        let mut desk = ChallengeDesk::new();
        let challenge = desk.issue("client-1", &keypair.public).unwrap();
        let json = serde_json::to_value(&challenge).unwrap();
        let hex_len = json["encapsulated"].as_str().unwrap().len();
        assert_eq!(hex_len, praxis_core::defaults::KEM_CIPHERTEXT_LEN * 2);
    }
}
