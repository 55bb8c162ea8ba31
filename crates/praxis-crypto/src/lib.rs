//! # praxis-crypto
//!
//! Cryptographic primitives for praxis appointment tunnels.
//!
//! The server that stores appointment data never sees it in plaintext.
//! Everything needed to make that true lives here:
//!
//! - **KEM Engine** ([`kem`]): ML-KEM-768 keygen (random or seed-
//!   deterministic), encapsulation, implicit-rejection decapsulation
//! - **AEAD Cipher** ([`cipher`]): AES-256-GCM payload envelopes with a
//!   fresh 96-bit IV per call
//! - **PIN Key-Stretcher** ([`kdf`]): Argon2id for PIN stretching,
//!   HKDF-SHA-256 for the deterministic 64-byte KEM seed
//! - **Secret Splitter** ([`split`]): XOR 2-of-2 custody shares, one held
//!   by the client (PIN-encrypted), one by the server
//! - **Tunnel Key Distributor** ([`tunnel`]): one symmetric tunnel key
//!   re-encapsulated independently for every authorized recipient
//! - **Wire format** ([`format`]): the canonical hex field layout for
//!   envelopes and grants
//!
//! ## Identity model
//!
//! A client's keypair is a pure function of (email, PIN, server share):
//!
//! ```rust
//! use praxis_crypto::{kdf, kem};
//!
//! let seed = kdf::derive_kem_seed("a@b.com", "123456", "deadbeef").unwrap();
//! let keypair = kem::KeyPair::from_seed(&seed);
//!
//! let again = kem::KeyPair::from_seed(
//!     &kdf::derive_kem_seed("a@b.com", "123456", "deadbeef").unwrap(),
//! );
//! assert_eq!(keypair.public.as_bytes(), again.public.as_bytes());
//! ```
//!
//! ## Tunnel distribution
//!
//! ```rust
//! use praxis_crypto::{kem::KeyPair, tunnel};
//!
//! let staff = KeyPair::generate();
//! let client = KeyPair::generate();
//! let key = tunnel::TunnelKey::generate();
//!
//! let report = tunnel::distribute(
//!     &key,
//!     &[
//!         tunnel::Recipient { id: "staff-1".into(), public_key: staff.public.as_bytes().to_vec() },
//!         tunnel::Recipient { id: "client".into(), public_key: client.public.as_bytes().to_vec() },
//!     ],
//! ).unwrap();
//! assert!(report.is_complete());
//!
//! let mine = report.grants.iter().find(|g| g.recipient_id == "client").unwrap();
//! let recovered = tunnel::open_grant(mine, &client.private).unwrap();
//! assert_eq!(recovered.as_bytes(), key.as_bytes());
//! ```

pub mod cipher;
pub mod error;
pub mod format;
pub mod kdf;
pub mod kem;
pub mod split;
pub mod tunnel;

// Re-export commonly used types
pub use cipher::EncryptedEnvelope;
pub use error::{CryptoError, CryptoResult};
pub use format::WireEnvelope;
pub use kdf::{client_id, derive_kem_seed, derive_key_from_pin, PinKdfParams, StretchedKey};
pub use kem::{KeyPair, PrivateKey, PublicKey, SharedSecret};
pub use split::{reconstruct, split, CustodyShare};
pub use tunnel::{
    distribute, open_grant, DistributionReport, Recipient, TunnelGrant, TunnelKey,
};

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Full custody workflow: deterministic identity, split, reconstruct,
    /// tunnel distribution, appointment encryption.
    #[test]
    fn test_full_custody_workflow() {
        // Client registers: identity is derived, never stored.
        let server_share_seed = hex::encode(cipher::generate_random::<32>());
        let seed = kdf::derive_kem_seed("a@b.com", "123456", &server_share_seed).unwrap();
        let keypair = kem::KeyPair::from_seed(&seed);

        // Private key is split; the server keeps one share.
        let shares = split::split(keypair.private.as_bytes(), 2, 2).unwrap();
        let recovered = split::reconstruct(&shares).unwrap();
        assert_eq!(recovered.as_slice(), keypair.private.as_bytes());

        // Tunnel key goes out to staff and the client.
        let staff = kem::KeyPair::generate();
        let tunnel_key = tunnel::TunnelKey::generate();
        let report = tunnel::distribute(
            &tunnel_key,
            &[
                tunnel::Recipient {
                    id: "staff-1".into(),
                    public_key: staff.public.as_bytes().to_vec(),
                },
                tunnel::Recipient {
                    id: "client".into(),
                    public_key: keypair.public.as_bytes().to_vec(),
                },
            ],
        )
        .unwrap();
        assert!(report.is_complete());

        // An appointment sealed under the tunnel key round-trips for both.
        let appointment = b"{\"start\":\"2026-09-01T10:30\",\"title\":\"checkup\"}";
        let envelope = cipher::encrypt(appointment, tunnel_key.as_bytes()).unwrap();

        for (id, private) in [("staff-1", &staff.private), ("client", &keypair.private)] {
            let grant = report.grants.iter().find(|g| g.recipient_id == id).unwrap();
            let key = tunnel::open_grant(grant, private).unwrap();
            let plaintext = cipher::decrypt(&envelope, key.as_bytes()).unwrap();
            assert_eq!(plaintext.as_slice(), appointment.as_slice());
        }
    }

    /// The same login triple reproduces the identity across "devices".
    #[test]
    fn test_cross_device_reconstruction() {
        let triple = ("patient@clinic.example", "424242", "00112233445566778899aabbccddeeff");

        let device_a = kem::KeyPair::from_seed(
            &kdf::derive_kem_seed(triple.0, triple.1, triple.2).unwrap(),
        );
        let device_b = kem::KeyPair::from_seed(
            &kdf::derive_kem_seed(triple.0, triple.1, triple.2).unwrap(),
        );

        assert_eq!(device_a.public.as_bytes(), device_b.public.as_bytes());
        assert_eq!(device_a.private.as_bytes(), device_b.private.as_bytes());

        // And a grant issued to one device opens on the other.
        let key = tunnel::TunnelKey::generate();
        let report = tunnel::distribute(
            &key,
            &[tunnel::Recipient {
                id: "client".into(),
                public_key: device_a.public.as_bytes().to_vec(),
            }],
        )
        .unwrap();
        let opened = tunnel::open_grant(&report.grants[0], &device_b.private).unwrap();
        assert_eq!(opened.as_bytes(), key.as_bytes());
    }
}
