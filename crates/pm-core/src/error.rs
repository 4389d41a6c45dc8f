use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Protocol(#[from] pm_proto::ProtoError),

    #[error(transparent)]
    Crypto(#[from] pm_crypto::CryptoError),

    #[error("handshake signature did not verify")]
    InvalidSignature,

    #[error("no established session with this peer")]
    NoSession,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("message log I/O error: {0}")]
    Log(#[from] std::io::Error),
}
