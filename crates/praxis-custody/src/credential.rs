//! Session credential lifecycle.
//!
//! A [`Custodian`] owns at most one [`SessionCredential`] at a time. The
//! credential is created by PIN authentication (or installed directly by
//! the passkey path), lives for a sliding inactivity window, and is wiped
//! in place on every exit: logout, expiry, re-authentication, and drop.
//!
//! This module is the synchronous core; [`crate::custodian`] wraps it in
//! an isolated task so callers never hold the key material themselves.

use serde::Serialize;
use tokio::time::{Duration, Instant};
use zeroize::Zeroize;

use praxis_core::{defaults, CustodyConfig, Error, Result};
use praxis_crypto::cipher::EncryptedEnvelope;
use praxis_crypto::kdf::{self, derive_kem_seed};
use praxis_crypto::kem::{self, KeyPair};
use praxis_crypto::tunnel::{self, TunnelGrant};

/// Where a session is in its lifecycle.
///
/// `Expired` and `LoggedOut` are terminal for the credential they end, but
/// not for the custodian: a fresh `authenticate` starts a new session from
/// any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Expired,
    LoggedOut,
}

/// Point-in-time view of the custodian, safe to hand to callers.
///
/// Carries the non-secret client id only; key material never leaves the
/// credential.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Hex client id of the authenticated subject, if any.
    pub client_id: Option<String>,
    /// Whole seconds until expiry, if a session is live.
    pub remaining_secs: Option<u64>,
}

/// The in-memory session secret: a KEM key pair bound to a subject.
///
/// The private half zeroizes on drop via [`praxis_crypto::kem::PrivateKey`];
/// the subject email is scrubbed here so a heap dump after logout shows
/// neither.
struct SessionCredential {
    keypair: KeyPair,
    subject_email: String,
    client_id: String,
    deadline: Instant,
}

impl Drop for SessionCredential {
    fn drop(&mut self) {
        self.subject_email.zeroize();
    }
}

/// Synchronous custody state machine.
///
/// Every secret-using operation checks the deadline first and, on success,
/// pushes it forward by the full inactivity window (sliding expiry). A
/// deadline in the past wipes the credential before the operation runs, so
/// an expired session can never decrypt.
pub struct Custodian {
    config: CustodyConfig,
    state: SessionState,
    credential: Option<SessionCredential>,
}

impl Custodian {
    pub fn new(config: CustodyConfig) -> Self {
        Self {
            config,
            state: SessionState::Unauthenticated,
            credential: None,
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.session_ttl_secs)
    }

    /// Establish a session from the login triple.
    ///
    /// Validates the PIN format before touching any key derivation, wipes
    /// any previous credential, and derives the deterministic key pair.
    /// Derivation succeeds even for a wrong PIN; correctness is only ever
    /// proven by a subsequent challenge or decryption, so nothing here
    /// reveals which input was bad.
    pub fn authenticate(&mut self, email: &str, pin: &str, server_share_hex: &str) -> Result<()> {
        // A second login replaces the first; the old credential is wiped
        // before anything else runs, so no failure below can leave a
        // prior session live.
        self.wipe(SessionState::Authenticating);

        if let Err(e) = validate_pin_format(pin) {
            self.wipe(SessionState::LoggedOut);
            return Err(e);
        }

        let mut seed = match derive_kem_seed(email, pin, server_share_hex) {
            Ok(seed) => seed,
            Err(e) => {
                // A half-finished login never leaves anything behind.
                self.wipe(SessionState::LoggedOut);
                return Err(e.into());
            }
        };
        let keypair = KeyPair::from_seed(&seed);
        seed.zeroize();

        self.install(keypair, email);
        Ok(())
    }

    /// Install an externally reconstructed key pair (passkey path).
    pub fn install(&mut self, keypair: KeyPair, email: &str) {
        self.credential = Some(SessionCredential {
            keypair,
            subject_email: email.trim().to_lowercase(),
            client_id: kdf::client_id(email),
            deadline: Instant::now() + self.ttl(),
        });
        self.state = SessionState::Authenticated;
    }

    /// Open a tunnel grant and decrypt one appointment envelope.
    pub fn decrypt_appointment(
        &mut self,
        grant: &TunnelGrant,
        envelope: &EncryptedEnvelope,
    ) -> Result<Vec<u8>> {
        let credential = self.live_credential()?;
        let tunnel_key = tunnel::open_grant(grant, &credential.keypair.private)?;
        let plaintext = praxis_crypto::cipher::decrypt(envelope, tunnel_key.as_bytes())?;
        self.touch();
        Ok(plaintext)
    }

    /// Decapsulate a login challenge and return the 32-byte response.
    ///
    /// The response is the recovered shared secret; a wrong key pair yields
    /// a wrong-but-well-formed response (implicit rejection), which the
    /// verifier rejects in constant time.
    pub fn decapsulate_challenge(&mut self, encapsulated: &[u8]) -> Result<[u8; 32]> {
        let credential = self.live_credential()?;
        let secret = kem::decapsulate(&credential.keypair.private, encapsulated)?;
        let response = *secret.as_bytes();
        self.touch();
        Ok(response)
    }

    /// Public encapsulation key of the live session.
    pub fn public_key(&mut self) -> Result<kem::PublicKey> {
        let credential = self.live_credential()?;
        let public = credential.keypair.public.clone();
        self.touch();
        Ok(public)
    }

    pub fn status(&mut self) -> SessionStatus {
        // Reading status does not extend the session, but it does observe
        // an already-passed deadline.
        self.expire_if_due();
        let now = Instant::now();
        let (client_id, remaining_secs) = match &self.credential {
            Some(c) => (
                Some(c.client_id.clone()),
                Some(c.deadline.saturating_duration_since(now).as_secs()),
            ),
            None => (None, None),
        };
        SessionStatus {
            state: self.state,
            client_id,
            remaining_secs,
        }
    }

    /// End the session and wipe the credential. Idempotent.
    pub fn logout(&mut self) {
        self.wipe(SessionState::LoggedOut);
    }

    /// Wipe the credential if the deadline has passed. Returns true when a
    /// live session was expired by this call.
    pub fn expire_if_due(&mut self) -> bool {
        match &self.credential {
            Some(c) if Instant::now() >= c.deadline => {
                self.wipe(SessionState::Expired);
                true
            }
            _ => false,
        }
    }

    /// Deadline of the live session, for the actor's expiry timer.
    pub fn deadline(&self) -> Option<Instant> {
        self.credential.as_ref().map(|c| c.deadline)
    }

    fn live_credential(&mut self) -> Result<&SessionCredential> {
        self.expire_if_due();
        match self.state {
            SessionState::Expired => Err(Error::SessionExpired),
            _ => self
                .credential
                .as_ref()
                .ok_or(Error::AuthenticationFailed),
        }
    }

    /// Slide the expiry window forward after a successful use.
    fn touch(&mut self) {
        let ttl = self.ttl();
        if let Some(c) = self.credential.as_mut() {
            c.deadline = Instant::now() + ttl;
        }
    }

    fn wipe(&mut self, next: SessionState) {
        // Dropping the credential zeroizes the private key and the email.
        self.credential = None;
        self.state = next;
    }
}

/// A PIN is exactly six ASCII digits. Checked before any key derivation
/// so malformed input never reaches Argon2.
fn validate_pin_format(pin: &str) -> Result<()> {
    if pin.len() == defaults::PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "PIN must be exactly {} digits",
            defaults::PIN_LENGTH
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_crypto::cipher;
    use praxis_crypto::tunnel::TunnelKey;

    const EMAIL: &str = "client@example.com";
    const PIN: &str = "483920";
    const SHARE: &str = "00aa11bb22cc33dd44ee55ff66778899";

    fn authed() -> Custodian {
        let mut c = Custodian::new(CustodyConfig::default());
        c.authenticate(EMAIL, PIN, SHARE).unwrap();
        c
    }

    #[test]
    fn fresh_custodian_is_unauthenticated() {
        let mut c = Custodian::new(CustodyConfig::default());
        let status = c.status();
        assert_eq!(status.state, SessionState::Unauthenticated);
        assert!(status.client_id.is_none());
        assert!(status.remaining_secs.is_none());
    }

    #[test]
    fn authenticate_establishes_session() {
        let mut c = authed();
        let status = c.status();
        assert_eq!(status.state, SessionState::Authenticated);
        assert_eq!(status.client_id.as_deref(), Some(&*kdf::client_id(EMAIL)));
        assert!(status.remaining_secs.unwrap() > 0);
    }

    #[test]
    fn pin_format_is_checked_before_derivation() {
        let mut c = Custodian::new(CustodyConfig::default());
        for bad in ["12345", "1234567", "12345a", "１２３４５６", ""] {
            let err = c.authenticate(EMAIL, bad, SHARE).unwrap_err();
            assert!(matches!(err, Error::InvalidInput(_)), "pin {bad:?}");
        }
        assert_eq!(c.status().state, SessionState::LoggedOut);
    }

    #[test]
    fn failed_reauth_wipes_the_prior_session() {
        let mut c = authed();
        // A malformed PIN on re-login must not leave the old credential
        // usable.
        let err = c.authenticate(EMAIL, "12ab", SHARE).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(c.status().state, SessionState::LoggedOut);
        assert!(matches!(
            c.public_key().unwrap_err(),
            Error::AuthenticationFailed
        ));
    }

    #[test]
    fn failed_derivation_lands_terminal() {
        let mut c = authed();
        let err = c.authenticate(EMAIL, PIN, "not hex!").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        // The previous credential was wiped before the attempt; nothing
        // half-built remains usable.
        assert_eq!(c.status().state, SessionState::LoggedOut);
        assert!(c.public_key().is_err());
    }

    #[test]
    fn same_triple_yields_same_keypair() {
        let mut a = authed();
        let mut b = authed();
        assert_eq!(
            a.public_key().unwrap().as_bytes(),
            b.public_key().unwrap().as_bytes()
        );
    }

    #[test]
    fn different_pin_yields_different_keypair() {
        let mut a = authed();
        let mut b = Custodian::new(CustodyConfig::default());
        b.authenticate(EMAIL, "000000", SHARE).unwrap();
        assert_ne!(
            a.public_key().unwrap().as_bytes(),
            b.public_key().unwrap().as_bytes()
        );
    }

    #[test]
    fn logout_is_terminal_and_idempotent() {
        let mut c = authed();
        c.logout();
        assert_eq!(c.status().state, SessionState::LoggedOut);
        c.logout();
        assert_eq!(c.status().state, SessionState::LoggedOut);
        assert!(matches!(
            c.public_key().unwrap_err(),
            Error::AuthenticationFailed
        ));
    }

    #[test]
    fn reauthentication_replaces_the_session() {
        let mut c = authed();
        let first = c.public_key().unwrap();
        c.authenticate("other@example.com", PIN, SHARE).unwrap();
        let second = c.public_key().unwrap();
        assert_ne!(first.as_bytes(), second.as_bytes());
        assert_eq!(
            c.status().client_id.as_deref(),
            Some(&*kdf::client_id("other@example.com"))
        );
    }

    #[test]
    fn decrypt_appointment_roundtrip() {
        let mut c = authed();
        let public = c.public_key().unwrap();

        let tunnel_key = TunnelKey::generate();
        let grants = tunnel::distribute(
            &tunnel_key,
            &[tunnel::Recipient {
                id: "self".into(),
                public_key: public.as_bytes().to_vec(),
            }],
        )
        .unwrap()
        .into_result()
        .unwrap();
        let envelope = cipher::encrypt(b"Tue 14:00 intake", tunnel_key.as_bytes()).unwrap();

        let plaintext = c.decrypt_appointment(&grants[0], &envelope).unwrap();
        assert_eq!(plaintext, b"Tue 14:00 intake");
    }

    #[test]
    fn challenge_response_matches_encapsulated_secret() {
        let mut c = authed();
        let public = c.public_key().unwrap();
        let (secret, encapsulated) = kem::encapsulate(&public).unwrap();
        let response = c.decapsulate_challenge(&encapsulated).unwrap();
        assert_eq!(&response, secret.as_bytes());
    }

    #[tokio::test(start_paused = true)]
    async fn session_expires_after_idle_window() {
        let mut c = authed();
        tokio::time::advance(Duration::from_secs(defaults::SESSION_TTL_SECS + 1)).await;
        assert!(matches!(
            c.public_key().unwrap_err(),
            Error::SessionExpired
        ));
        assert_eq!(c.status().state, SessionState::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn use_slides_the_expiry_window() {
        let mut c = authed();
        // Nine minutes idle, then a use; repeat. Total elapsed exceeds the
        // window but no single gap does.
        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(540)).await;
            c.public_key().unwrap();
        }
        assert_eq!(c.status().state, SessionState::Authenticated);
    }

    #[tokio::test(start_paused = true)]
    async fn status_does_not_extend_the_session() {
        let mut c = authed();
        tokio::time::advance(Duration::from_secs(540)).await;
        assert_eq!(c.status().state, SessionState::Authenticated);
        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(c.status().state, SessionState::Expired);
    }
}
