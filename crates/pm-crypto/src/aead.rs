//! Message-channel AEAD: ChaCha20-Poly1305 with a 12-byte random nonce and
//! empty associated data.
//!
//! Unlike a wire-framed AEAD helper that concatenates nonce and ciphertext,
//! this one returns/accepts the nonce and ciphertext as separate values —
//! the wire-framing decision belongs to `pm-proto`'s `CiphertextPayload`.

use chacha20poly1305::{
    aead::{Aead, KeyInit, OsRng},
    AeadCore, ChaCha20Poly1305, Key, Nonce,
};

use crate::error::CryptoError;

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` with a freshly generated random nonce.
/// Returns `(nonce, ciphertext_with_tag)`.
pub fn encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<([u8; NONCE_LEN], Vec<u8>), CryptoError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::AeadEncrypt)?;
    Ok((nonce.into(), ciphertext))
}

/// Decrypt `ciphertext` (tag appended) under `key` and `nonce`.
pub fn decrypt(key: &[u8; 32], nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if ciphertext.len() < TAG_LEN {
        return Err(CryptoError::AeadDecrypt);
    }
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AeadDecrypt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let key = [9u8; 32];
        let (nonce, ct) = encrypt(&key, b"hello").unwrap();
        assert_eq!(nonce.len(), NONCE_LEN);
        assert_eq!(ct.len(), 5 + TAG_LEN);
        let pt = decrypt(&key, &nonce, &ct).unwrap();
        assert_eq!(pt, b"hello");
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let key = [9u8; 32];
        let (nonce, mut ct) = encrypt(&key, b"hello").unwrap();
        ct[0] ^= 0x01;
        assert!(decrypt(&key, &nonce, &ct).is_err());
    }

    #[test]
    fn tampered_nonce_fails() {
        let key = [9u8; 32];
        let (mut nonce, ct) = encrypt(&key, b"hello").unwrap();
        nonce[0] ^= 0x01;
        assert!(decrypt(&key, &nonce, &ct).is_err());
    }

    #[test]
    fn wrong_key_fails() {
        let key = [9u8; 32];
        let (nonce, ct) = encrypt(&key, b"hello").unwrap();
        let other_key = [1u8; 32];
        assert!(decrypt(&other_key, &nonce, &ct).is_err());
    }
}
