//! HKDF-SHA256 session key derivation.
//!
//! `derive` is the only KDF entry point the session layer is allowed to
//! use: HKDF-Extract-then-Expand with SHA-256, an empty salt, and a
//! caller-supplied domain-separating `info` context.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::CryptoError;

/// Derive a 32-byte symmetric key from a 32-byte shared secret and an
/// `info` context string.
pub fn derive(shared_secret: &[u8; 32], info: &[u8]) -> Result<[u8; 32], CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut out = [0u8; 32];
    hk.expand(info, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(out)
}

/// Build the canonical session HKDF info string `"session:" || join("|", sort([a, b]))`.
/// Identical regardless of which side (initiator or responder) computes it.
pub fn session_info(a: &str, b: &str) -> Vec<u8> {
    let mut names = [a, b];
    names.sort_unstable();
    let mut info = Vec::with_capacity(8 + a.len() + b.len() + 1);
    info.extend_from_slice(b"session:");
    info.extend_from_slice(names[0].as_bytes());
    info.push(b'|');
    info.extend_from_slice(names[1].as_bytes());
    info
}
