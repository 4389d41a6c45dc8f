//! pm-crypto — cryptographic primitives for the palisade secure messaging core.
//!
//! # Design principles
//! - No custom crypto: every primitive comes from an audited crate.
//! - Secret material that can be zeroized is zeroized on drop.
//! - Ephemeral key material is consumed exactly once, by construction.
//!
//! # Module layout
//! - `identity`  — long-term Ed25519 signing keypair, load/create/sign/verify
//! - `ephemeral` — one-shot X25519 keypairs for the handshake
//! - `kdf`       — HKDF-SHA256 session key derivation
//! - `aead`      — ChaCha20-Poly1305 message encryption
//! - `error`     — unified error type

pub mod aead;
pub mod ephemeral;
pub mod error;
pub mod identity;
pub mod kdf;

pub use error::CryptoError;
pub use identity::{Identity, IdentityPublicKey};
