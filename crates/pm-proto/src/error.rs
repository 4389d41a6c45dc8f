use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("unknown or missing payload type: {0:?}")]
    PayloadKind(Option<String>),

    #[error("payload field {field} is malformed: {reason}")]
    PayloadField { field: &'static str, reason: String },

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtoError {
    pub fn field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::PayloadField { field, reason: reason.into() }
    }
}
