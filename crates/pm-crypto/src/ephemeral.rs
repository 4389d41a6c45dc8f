//! One-shot X25519 ephemeral keys used by the handshake.
//!
//! `x25519_dalek::EphemeralSecret` is intentionally not `Clone`: it can only
//! be consumed once by `diffie_hellman`, which is exactly the "generate
//! once, use once, then it no longer exists" lifecycle the handshake needs.
//! No separate zeroize step is required for the secret half — moving it
//! into `diffie_hellman` is itself the disposal.

use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey};

/// A fresh ephemeral X25519 keypair: the secret half you hold until the
/// handshake completes, and the public half you transmit.
pub struct EphemeralKeyPair {
    pub secret: EphemeralSecret,
    pub public: [u8; 32],
}

pub fn generate() -> EphemeralKeyPair {
    let secret = EphemeralSecret::random_from_rng(OsRng);
    let public = PublicKey::from(&secret);
    EphemeralKeyPair {
        secret,
        public: public.to_bytes(),
    }
}

/// Compute the X25519 shared secret, consuming the ephemeral secret.
pub fn diffie_hellman(secret: EphemeralSecret, peer_public: &[u8; 32]) -> [u8; 32] {
    let peer = PublicKey::from(*peer_public);
    secret.diffie_hellman(&peer).to_bytes()
}
