//! Text encoding for on-the-wire binary fields: standard base64 (RFC 4648),
//! strict decoding that rejects malformed padding.

use base64::engine::{general_purpose::STANDARD, Engine as _};

use crate::error::ProtoError;

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(s: &str) -> Result<Vec<u8>, ProtoError> {
    STANDARD.decode(s).map_err(ProtoError::from)
}

/// Decode `s` and require it to be exactly `len` bytes, naming `field` in
/// any error so callers don't have to re-wrap.
pub fn decode_exact(field: &'static str, s: &str, len: usize) -> Result<Vec<u8>, ProtoError> {
    let bytes = decode(s).map_err(|e| ProtoError::field(field, e.to_string()))?;
    if bytes.len() != len {
        return Err(ProtoError::field(field, format!("expected {len} bytes, got {}", bytes.len())));
    }
    Ok(bytes)
}
