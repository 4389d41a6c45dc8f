use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("identity key I/O failed: {0}")]
    IdentityIo(#[from] std::io::Error),

    #[error("identity key is not a valid Ed25519 PKCS#8 key: {0}")]
    IdentityFormat(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("signature verification failed")]
    SignatureVerification,

    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("AEAD decryption failed (authentication tag mismatch — possible tampering)")]
    AeadDecrypt,

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),
}
