//! pm-proto — wire types and codec for the palisade secure messaging core.
//!
//! # Modules
//! - `codec`   — base64 text encoding for binary fields
//! - `payload` — inner payloads carried inside a relay envelope (handshake, ciphertext)
//! - `wire`    — the outermost broker envelope (register / relay / user_list / error)
//! - `error`   — unified protocol error type

pub mod codec;
pub mod error;
pub mod payload;
pub mod wire;

pub use error::ProtoError;
pub use payload::{CiphertextPayload, HandshakeFlight, InnerPayload};
pub use wire::{ClientFrame, ServerFrame};
