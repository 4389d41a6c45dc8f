//! Inner payload shapes carried inside a relayed envelope: the two
//! handshake flights and the ciphertext message.

use serde::{Deserialize, Serialize};

use crate::codec;
use crate::error::ProtoError;

/// Wire shape shared by both handshake flights (`handshake_init` and
/// `handshake` differ only in which side sent them, not in structure).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandshakeFlight {
    /// base64(32) — sender's long-term Ed25519 identity public key.
    pub identity: String,
    /// base64(32) — sender's fresh X25519 ephemeral public key.
    pub ephemeral: String,
    /// base64(64) — Ed25519 signature by `identity` over the raw ephemeral bytes.
    pub sig: String,
}

/// Decoded, length-checked form of a `HandshakeFlight`.
pub struct DecodedHandshake {
    pub identity: [u8; 32],
    pub ephemeral: [u8; 32],
    pub sig: [u8; 64],
}

impl HandshakeFlight {
    pub fn new(identity: &[u8; 32], ephemeral: &[u8; 32], sig: &[u8; 64]) -> Self {
        Self {
            identity: codec::encode(identity),
            ephemeral: codec::encode(ephemeral),
            sig: codec::encode(sig),
        }
    }

    pub fn decode(&self) -> Result<DecodedHandshake, ProtoError> {
        let identity = codec::decode_exact("identity", &self.identity, 32)?;
        let ephemeral = codec::decode_exact("ephemeral", &self.ephemeral, 32)?;
        let sig = codec::decode_exact("sig", &self.sig, 64)?;
        Ok(DecodedHandshake {
            identity: identity.try_into().expect("length checked above"),
            ephemeral: ephemeral.try_into().expect("length checked above"),
            sig: sig.try_into().expect("length checked above"),
        })
    }
}

/// `{type:"ciphertext", nonce: b64(12), ct: b64(>=16)}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiphertextPayload {
    pub nonce: String,
    pub ct: String,
}

pub struct DecodedCiphertext {
    pub nonce: [u8; 12],
    pub ct: Vec<u8>,
}

impl CiphertextPayload {
    pub fn new(nonce: &[u8; 12], ct: &[u8]) -> Self {
        Self {
            nonce: codec::encode(nonce),
            ct: codec::encode(ct),
        }
    }

    pub fn decode(&self) -> Result<DecodedCiphertext, ProtoError> {
        let nonce = codec::decode_exact("nonce", &self.nonce, 12)?;
        let ct = codec::decode(&self.ct).map_err(|e| ProtoError::field("ct", e.to_string()))?;
        if ct.len() < 16 {
            return Err(ProtoError::field("ct", "ciphertext shorter than AEAD tag"));
        }
        Ok(DecodedCiphertext {
            nonce: nonce.try_into().expect("length checked above"),
            ct,
        })
    }
}

/// The `"type"`-discriminated inner payload carried by a relay envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InnerPayload {
    HandshakeInit(HandshakeFlight),
    Handshake(HandshakeFlight),
    Ciphertext(CiphertextPayload),
}

impl InnerPayload {
    /// Parse a raw JSON payload, surfacing an unknown/missing `"type"` as
    /// `ProtoError::PayloadKind` and any other structural mismatch (a known
    /// type with a missing or mistyped field) as a JSON error.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ProtoError> {
        let kind = value.get("type").and_then(|v| v.as_str()).map(String::from);
        match kind.as_deref() {
            Some("handshake_init") | Some("handshake") | Some("ciphertext") => {
                serde_json::from_value(value).map_err(ProtoError::from)
            }
            _ => Err(ProtoError::PayloadKind(kind)),
        }
    }
}
