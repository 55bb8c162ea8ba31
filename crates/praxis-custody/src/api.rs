//! Custody API boundary.
//!
//! The server only ever handles ciphertext, public keys, shares, and
//! challenge transcripts; every payload crossing this boundary is safe to
//! store. [`CustodyApi`] is the seam, [`HttpCustodyApi`] the production
//! client, and [`InMemoryCustodyApi`] an in-process double for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use praxis_core::{defaults, Error, Result};
use praxis_crypto::format::WireEnvelope;
use praxis_crypto::tunnel::TunnelGrant;

/// A staff member's registered encryption identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffKey {
    pub staff_id: String,
    /// Hex-encoded ML-KEM-768 public key.
    pub public_key_hex: String,
}

/// A login challenge as served by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginChallenge {
    pub challenge_id: Uuid,
    /// Hex-encoded KEM encapsulation.
    pub encapsulated_hex: String,
}

/// A new appointment submission: one envelope plus a grant per reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub client_id: String,
    pub envelope: WireEnvelope,
    pub grants: Vec<TunnelGrant>,
}

/// A stored appointment as returned to its owner, with only the grant
/// addressed to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub appointment_id: Uuid,
    pub envelope: WireEnvelope,
    pub grant: TunnelGrant,
}

/// Contract between the client runtime and the custody server.
#[async_trait]
pub trait CustodyApi: Send + Sync {
    /// Public keys of every staff member who must be able to read new
    /// appointments.
    async fn staff_keys(&self) -> Result<Vec<StaffKey>>;

    /// Request a login challenge for a claimant.
    async fn fetch_challenge(&self, client_id: &str) -> Result<LoginChallenge>;

    /// Submit a decapsulated challenge response. Returns whether the
    /// server accepted it.
    async fn submit_challenge_response(
        &self,
        challenge_id: Uuid,
        response_hex: &str,
    ) -> Result<bool>;

    /// Store a new encrypted appointment with its grants.
    async fn submit_appointment(&self, appointment: &NewAppointment) -> Result<Uuid>;

    /// List the caller's appointments, each with the grant addressed to
    /// them.
    async fn list_appointments(&self, client_id: &str) -> Result<Vec<AppointmentRecord>>;
}

/// HTTP client for the custody server.
pub struct HttpCustodyApi {
    client: Client,
    base_url: String,
}

impl HttpCustodyApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(defaults::API_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Request(format!("Server rejected request: {}", e)))?;
        response
            .json()
            .await
            .map_err(|e| Error::Request(format!("Failed to parse response: {}", e)))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Request(format!("Server rejected request: {}", e)))?;
        response
            .json()
            .await
            .map_err(|e| Error::Request(format!("Failed to parse response: {}", e)))
    }
}

#[derive(Serialize)]
struct ChallengeRequest<'a> {
    client_id: &'a str,
}

#[derive(Serialize)]
struct ChallengeResponseBody<'a> {
    challenge_id: Uuid,
    response_hex: &'a str,
}

#[derive(Deserialize)]
struct VerifyReply {
    verified: bool,
}

#[derive(Deserialize)]
struct SubmitReply {
    appointment_id: Uuid,
}

#[async_trait]
impl CustodyApi for HttpCustodyApi {
    async fn staff_keys(&self) -> Result<Vec<StaffKey>> {
        self.get_json("/api/v1/staff-keys").await
    }

    async fn fetch_challenge(&self, client_id: &str) -> Result<LoginChallenge> {
        self.post_json("/api/v1/auth/challenge", &ChallengeRequest { client_id })
            .await
    }

    async fn submit_challenge_response(
        &self,
        challenge_id: Uuid,
        response_hex: &str,
    ) -> Result<bool> {
        let reply: VerifyReply = self
            .post_json(
                "/api/v1/auth/verify",
                &ChallengeResponseBody {
                    challenge_id,
                    response_hex,
                },
            )
            .await?;
        Ok(reply.verified)
    }

    async fn submit_appointment(&self, appointment: &NewAppointment) -> Result<Uuid> {
        let reply: SubmitReply = self.post_json("/api/v1/appointments", appointment).await?;
        debug!(appointment_id = %reply.appointment_id, "Appointment stored");
        Ok(reply.appointment_id)
    }

    async fn list_appointments(&self, client_id: &str) -> Result<Vec<AppointmentRecord>> {
        self.get_json(&format!("/api/v1/appointments?client_id={}", client_id))
            .await
    }
}

/// In-process custody server double.
///
/// Backs the integration tests with the same structural guarantees as the
/// real server: it stores only ciphertext and verifies challenges through
/// a [`crate::challenge::ChallengeDesk`].
pub struct InMemoryCustodyApi {
    state: Mutex<InMemoryState>,
}

struct InMemoryState {
    staff: Vec<StaffKey>,
    clients: HashMap<String, praxis_crypto::kem::PublicKey>,
    desk: crate::challenge::ChallengeDesk,
    appointments: Vec<(Uuid, NewAppointment)>,
}

impl InMemoryCustodyApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InMemoryState {
                staff: Vec::new(),
                clients: HashMap::new(),
                desk: crate::challenge::ChallengeDesk::new(),
                appointments: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::Internal("Custody state lock poisoned".into()))
    }

    /// Register a staff public key.
    pub fn add_staff(&self, staff_id: &str, public_key: &[u8]) -> Result<()> {
        let mut state = self.lock()?;
        state.staff.push(StaffKey {
            staff_id: staff_id.to_string(),
            public_key_hex: hex::encode(public_key),
        });
        Ok(())
    }

    /// Register a client's public key for challenge login.
    pub fn register_client(
        &self,
        client_id: &str,
        public: praxis_crypto::kem::PublicKey,
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.clients.insert(client_id.to_string(), public);
        Ok(())
    }

    /// Install the failed-attempt observer on the inner desk.
    pub fn set_attempt_observer(&self, observer: crate::challenge::AttemptObserver) -> Result<()> {
        let mut state = self.lock()?;
        let desk = std::mem::take(&mut state.desk).with_observer(observer);
        state.desk = desk;
        Ok(())
    }
}

impl Default for InMemoryCustodyApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustodyApi for InMemoryCustodyApi {
    async fn staff_keys(&self) -> Result<Vec<StaffKey>> {
        Ok(self.lock()?.staff.clone())
    }

    async fn fetch_challenge(&self, client_id: &str) -> Result<LoginChallenge> {
        let mut state = self.lock()?;
        let public = state
            .clients
            .get(client_id)
            .cloned()
            .ok_or(Error::AuthenticationFailed)?;
        let issued = state.desk.issue(client_id, &public)?;
        Ok(LoginChallenge {
            challenge_id: issued.challenge_id,
            encapsulated_hex: hex::encode(&issued.encapsulated),
        })
    }

    async fn submit_challenge_response(
        &self,
        challenge_id: Uuid,
        response_hex: &str,
    ) -> Result<bool> {
        let response = hex::decode(response_hex)
            .map_err(|_| Error::InvalidInput("response is not valid hex".into()))?;
        let mut state = self.lock()?;
        Ok(matches!(
            state.desk.verify(challenge_id, &response),
            crate::challenge::ChallengeOutcome::Verified
        ))
    }

    async fn submit_appointment(&self, appointment: &NewAppointment) -> Result<Uuid> {
        let appointment_id = Uuid::now_v7();
        self.lock()?
            .appointments
            .push((appointment_id, appointment.clone()));
        Ok(appointment_id)
    }

    async fn list_appointments(&self, client_id: &str) -> Result<Vec<AppointmentRecord>> {
        let state = self.lock()?;
        let mut records = Vec::new();
        for (appointment_id, appointment) in &state.appointments {
            if appointment.client_id != client_id {
                continue;
            }
            // Only the grant addressed to the caller is returned, as the
            // real server does.
            if let Some(grant) = appointment
                .grants
                .iter()
                .find(|g| g.recipient_id == client_id)
            {
                records.push(AppointmentRecord {
                    appointment_id: *appointment_id,
                    envelope: appointment.envelope.clone(),
                    grant: grant.clone(),
                });
            }
        }
        Ok(records)
    }
}
