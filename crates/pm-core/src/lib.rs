//! pm-core — the two-party encrypted session core.
//!
//! Owns the handshake engine, the per-peer session table, the message
//! channel, and the `Client` façade an embedder (CLI, GUI, test harness)
//! drives. Knows nothing about how bytes actually reach the broker — that
//! seam is the [`relay::Relay`] trait, implemented by `pm-relay`.
//!
//! # Modules
//! - `peer`      — `PeerName`, the broker username newtype
//! - `session`   — per-peer session state machine and table
//! - `handshake` — the two-flight signed handshake
//! - `channel`   — AEAD message encryption/decryption over an established session
//! - `sink`      — the `EventSink`/`AsyncEventSink` embedder-facing event traits
//! - `relay`     — the transport seam (`pm-relay` implements this)
//! - `log`       — append-only ciphertext-only message log
//! - `client`    — the `Client` façade wiring everything together
//! - `error`     — unified error type

pub mod channel;
pub mod client;
pub mod error;
pub mod handshake;
pub mod log;
pub mod peer;
pub mod relay;
pub mod session;
pub mod sink;

pub use client::Client;
pub use error::CoreError;
pub use log::MessageLog;
pub use peer::PeerName;
pub use relay::Relay;
pub use session::{Session, SessionState, SessionTable};
pub use sink::{AsyncEventSink, Event, EventSink, SinkHandle};
