//! The message channel: encrypt outbound plaintext under the session key,
//! decrypt inbound ciphertext.

use pm_crypto::aead;
use pm_proto::CiphertextPayload;

use crate::error::CoreError;
use crate::peer::PeerName;
use crate::session::SessionTable;

pub enum EncryptOutcome {
    /// No established session — the caller decides whether to queue the
    /// plaintext and/or kick off a handshake.
    NoSession,
    Ready(CiphertextPayload),
}

pub fn encrypt(table: &SessionTable, peer: &PeerName, plaintext: &[u8]) -> Result<EncryptOutcome, CoreError> {
    let Some(key) = table.established_key(peer) else {
        return Ok(EncryptOutcome::NoSession);
    };
    let (nonce, ct) = aead::encrypt(&key, plaintext)?;
    Ok(EncryptOutcome::Ready(CiphertextPayload::new(&nonce, &ct)))
}

pub enum DecryptOutcome {
    NoSession,
    /// AEAD authentication failed — almost certainly tampering or a stale
    /// key, never surfaced as plaintext.
    AuthFailed,
    /// The AEAD tag verified — this payload genuinely came from a holder of
    /// the session key — but the plaintext it protects is not valid UTF-8.
    /// Distinct from `AuthFailed`: this is not evidence of tampering, just a
    /// peer sending a non-text payload this channel doesn't support.
    Malformed,
    Message(String),
}

pub fn decrypt(table: &SessionTable, peer: &PeerName, payload: &CiphertextPayload) -> Result<DecryptOutcome, CoreError> {
    let Some(key) = table.established_key(peer) else {
        return Ok(DecryptOutcome::NoSession);
    };
    let decoded = payload.decode()?;
    match aead::decrypt(&key, &decoded.nonce, &decoded.ct) {
        Ok(plaintext) => match String::from_utf8(plaintext) {
            Ok(text) => Ok(DecryptOutcome::Message(text)),
            Err(_) => Ok(DecryptOutcome::Malformed),
        },
        Err(_) => Ok(DecryptOutcome::AuthFailed),
    }
}
