//! Isolated session custodian actor.
//!
//! The [`Custodian`] state machine runs inside its own tokio task; the rest
//! of the process talks to it exclusively through a [`CustodianHandle`].
//! Key material therefore lives in exactly one place, requests are served
//! strictly one at a time, and a background timer wipes the session the
//! moment its sliding deadline passes, whether or not anyone is calling.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::sleep_until;
use tracing::{debug, info, warn};
use uuid::Uuid;

use praxis_core::{defaults, CustodyConfig, Error, Result};
use praxis_crypto::format::WireEnvelope;
use praxis_crypto::kem::PublicKey;
use praxis_crypto::tunnel::TunnelGrant;

use crate::credential::{Custodian, SessionStatus};

/// Commands a caller can send to the custodian.
pub enum CustodianRequest {
    /// Establish a session from the login triple.
    Authenticate {
        email: String,
        pin: String,
        server_share_hex: String,
    },
    /// Open a tunnel grant and decrypt one appointment envelope.
    DecryptAppointment {
        grant: TunnelGrant,
        envelope: WireEnvelope,
    },
    /// Decapsulate a login challenge with the session key.
    DecapsulateChallenge { encapsulated: Vec<u8> },
    /// Public encapsulation key of the live session.
    GetPublicKey,
    /// Non-secret snapshot of the session state.
    GetStatus,
    /// End the session and wipe the credential.
    Logout,
}

// PINs and plaintext must not leak through Debug formatting; both enums
// print the variant name only.
impl std::fmt::Debug for CustodianRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(operation_name(self))
    }
}

/// Successful reply to a [`CustodianRequest`], one variant per request.
pub enum CustodianResponse {
    Done,
    Plaintext(Vec<u8>),
    ChallengeResponse([u8; 32]),
    PublicKey(PublicKey),
    Status(SessionStatus),
}

impl std::fmt::Debug for CustodianResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CustodianResponse::Done => "Done",
            CustodianResponse::Plaintext(_) => "Plaintext([REDACTED])",
            CustodianResponse::ChallengeResponse(_) => "ChallengeResponse([REDACTED])",
            CustodianResponse::PublicKey(_) => "PublicKey",
            CustodianResponse::Status(_) => "Status",
        };
        f.write_str(name)
    }
}

/// Unsolicited event broadcast by the custodian task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodianEvent {
    /// The sliding deadline passed and the credential was wiped.
    SessionExpired,
}

struct CustodianMessage {
    message_id: Uuid,
    request: CustodianRequest,
    reply: oneshot::Sender<Result<CustodianResponse>>,
}

/// Cloneable handle to a running custodian task.
///
/// The task exits (wiping any live credential) once every handle is
/// dropped.
#[derive(Clone)]
pub struct CustodianHandle {
    tx: mpsc::Sender<CustodianMessage>,
    event_tx: broadcast::Sender<CustodianEvent>,
}

impl CustodianHandle {
    /// Send one request and wait for its reply.
    ///
    /// Every request is answered exactly once; a closed channel means the
    /// custodian task is gone.
    pub async fn request(&self, request: CustodianRequest) -> Result<CustodianResponse> {
        let message_id = Uuid::now_v7();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(CustodianMessage {
                message_id,
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::Internal("Custodian task is not running".into()))?;
        reply_rx
            .await
            .map_err(|_| Error::Internal("Custodian dropped a request".into()))?
    }

    pub async fn authenticate(&self, email: &str, pin: &str, server_share_hex: &str) -> Result<()> {
        match self
            .request(CustodianRequest::Authenticate {
                email: email.to_string(),
                pin: pin.to_string(),
                server_share_hex: server_share_hex.to_string(),
            })
            .await?
        {
            CustodianResponse::Done => Ok(()),
            other => Err(unexpected_reply(other)),
        }
    }

    pub async fn decrypt_appointment(
        &self,
        grant: TunnelGrant,
        envelope: WireEnvelope,
    ) -> Result<Vec<u8>> {
        match self
            .request(CustodianRequest::DecryptAppointment { grant, envelope })
            .await?
        {
            CustodianResponse::Plaintext(plaintext) => Ok(plaintext),
            other => Err(unexpected_reply(other)),
        }
    }

    pub async fn decapsulate_challenge(&self, encapsulated: Vec<u8>) -> Result<[u8; 32]> {
        match self
            .request(CustodianRequest::DecapsulateChallenge { encapsulated })
            .await?
        {
            CustodianResponse::ChallengeResponse(response) => Ok(response),
            other => Err(unexpected_reply(other)),
        }
    }

    pub async fn public_key(&self) -> Result<PublicKey> {
        match self.request(CustodianRequest::GetPublicKey).await? {
            CustodianResponse::PublicKey(public) => Ok(public),
            other => Err(unexpected_reply(other)),
        }
    }

    pub async fn status(&self) -> Result<SessionStatus> {
        match self.request(CustodianRequest::GetStatus).await? {
            CustodianResponse::Status(status) => Ok(status),
            other => Err(unexpected_reply(other)),
        }
    }

    pub async fn logout(&self) -> Result<()> {
        match self.request(CustodianRequest::Logout).await? {
            CustodianResponse::Done => Ok(()),
            other => Err(unexpected_reply(other)),
        }
    }

    /// Subscribe to unsolicited custodian events.
    pub fn events(&self) -> broadcast::Receiver<CustodianEvent> {
        self.event_tx.subscribe()
    }
}

fn unexpected_reply(response: CustodianResponse) -> Error {
    Error::Internal(format!("Unexpected custodian reply: {response:?}"))
}

/// Spawn a custodian task and return its handle.
pub fn spawn(config: CustodyConfig) -> CustodianHandle {
    let (tx, rx) = mpsc::channel(defaults::CUSTODIAN_QUEUE_CAPACITY);
    let (event_tx, _) = broadcast::channel(defaults::EVENT_BUS_CAPACITY);

    let handle = CustodianHandle {
        tx,
        event_tx: event_tx.clone(),
    };

    tokio::spawn(run(config, rx, event_tx));

    handle
}

async fn run(
    config: CustodyConfig,
    mut rx: mpsc::Receiver<CustodianMessage>,
    event_tx: broadcast::Sender<CustodianEvent>,
) {
    let ttl_secs = config.session_ttl_secs;
    let mut custodian = Custodian::new(config);
    info!(ttl_secs, "Session custodian started");

    loop {
        let deadline = custodian.deadline();
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) => handle_message(&mut custodian, message),
                // All handles dropped.
                None => break,
            },
            // Only armed while a session is live. sleep_until is
            // re-created each iteration, so a deadline pushed forward by
            // use is picked up automatically.
            _ = async { sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)).await },
                if deadline.is_some() =>
            {
                if custodian.expire_if_due() {
                    info!("Session expired, credential wiped");
                    let _ = event_tx.send(CustodianEvent::SessionExpired);
                }
            }
        }
    }

    // Wipe on shutdown so the credential never outlives its task.
    custodian.logout();
    debug!("Session custodian stopped");
}

fn handle_message(custodian: &mut Custodian, message: CustodianMessage) {
    let CustodianMessage {
        message_id,
        request,
        reply,
    } = message;
    let operation = operation_name(&request);

    let result = match request {
        CustodianRequest::Authenticate {
            email,
            pin,
            server_share_hex,
        } => custodian
            .authenticate(&email, &pin, &server_share_hex)
            .map(|()| CustodianResponse::Done),
        CustodianRequest::DecryptAppointment { grant, envelope } => envelope
            .decode()
            .map_err(Error::from)
            .and_then(|envelope| custodian.decrypt_appointment(&grant, &envelope))
            .map(CustodianResponse::Plaintext),
        CustodianRequest::DecapsulateChallenge { encapsulated } => custodian
            .decapsulate_challenge(&encapsulated)
            .map(CustodianResponse::ChallengeResponse),
        CustodianRequest::GetPublicKey => {
            custodian.public_key().map(CustodianResponse::PublicKey)
        }
        CustodianRequest::GetStatus => Ok(CustodianResponse::Status(custodian.status())),
        CustodianRequest::Logout => {
            custodian.logout();
            Ok(CustodianResponse::Done)
        }
    };

    match &result {
        Ok(_) => debug!(%message_id, operation, "Custodian request served"),
        // Plaintext and key material never appear here; errors are
        // already generic by construction.
        Err(e) => warn!(%message_id, operation, error_msg = %e, "Custodian request failed"),
    }

    // The caller may have given up waiting; that is not the custodian's
    // problem.
    let _ = reply.send(result);
}

fn operation_name(request: &CustodianRequest) -> &'static str {
    match request {
        CustodianRequest::Authenticate { .. } => "authenticate",
        CustodianRequest::DecryptAppointment { .. } => "decrypt_appointment",
        CustodianRequest::DecapsulateChallenge { .. } => "decapsulate_challenge",
        CustodianRequest::GetPublicKey => "get_public_key",
        CustodianRequest::GetStatus => "get_status",
        CustodianRequest::Logout => "logout",
    }
}
