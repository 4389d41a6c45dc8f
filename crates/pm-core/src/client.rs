//! The embedder-facing façade: one `Client` per running process, wiring
//! together identity, session table, transport, sink, and message log.

use pm_crypto::Identity;
use pm_proto::{InnerPayload, ServerFrame};
use serde_json::Value;

use crate::channel::{self, DecryptOutcome, EncryptOutcome};
use crate::error::CoreError;
use crate::handshake::{self, InitOutcome, ReplyOutcome};
use crate::log::MessageLog;
use crate::peer::PeerName;
use crate::relay::Relay;
use crate::session::SessionTable;
use crate::sink::{Event, SinkHandle};

pub struct Client<R: Relay> {
    identity: Identity,
    username: String,
    table: SessionTable,
    relay: R,
    sink: SinkHandle,
    log: MessageLog,
}

impl<R: Relay> Client<R> {
    pub fn new(identity: Identity, username: String, relay: R, sink: SinkHandle, log: MessageLog) -> Self {
        Self {
            identity,
            username,
            table: SessionTable::new(),
            relay,
            sink,
            log,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn has_session(&self, peer: &str) -> bool {
        self.table.has_established(&PeerName::from(peer))
    }

    /// The raw established session key for `peer`, if any. Never put on the
    /// wire or logged; exposed so callers (tests, diagnostics) can confirm
    /// that two sides of a handshake converged on the same key.
    pub fn session_key(&self, peer: &str) -> Option<[u8; 32]> {
        self.table.established_key(&PeerName::from(peer))
    }

    /// Forget `peer` outright: drop any pending ephemeral, established key,
    /// and queued outbound plaintext for it. A later `send_message` or
    /// `initiate_handshake` starts that peer from `None` as if it had never
    /// been seen. Does not notify the peer or the broker.
    pub fn forget_peer(&mut self, peer: &str) {
        self.table.remove(&PeerName::from(peer));
    }

    /// Initiate a handshake with `peer`. Always sends a fresh
    /// `handshake_init`, superseding any handshake already in flight to
    /// the same peer.
    pub async fn initiate_handshake(&mut self, peer: &str) -> Result<(), CoreError> {
        let peer_name = PeerName::from(peer);
        let initiated = handshake::initiate(&self.identity, &mut self.table, peer_name);
        let payload = serde_json::to_value(InnerPayload::HandshakeInit(initiated.flight))
            .expect("HandshakeFlight always serializes");
        self.relay.send_to(peer, payload).await
    }

    /// Send a plaintext message to `peer`. If no session is established
    /// yet, the message is queued for delivery once one is, and
    /// `Err(CoreError::NoSession)` is returned so the embedder knows to
    /// call [`Client::initiate_handshake`].
    pub async fn send_message(&mut self, peer: &str, text: &str) -> Result<(), CoreError> {
        let peer_name = PeerName::from(peer);
        match channel::encrypt(&self.table, &peer_name, text.as_bytes())? {
            EncryptOutcome::Ready(payload) => self.dispatch_ciphertext(&peer_name, payload).await,
            EncryptOutcome::NoSession => {
                self.table.enqueue_outbound(peer_name, text.to_string());
                Err(CoreError::NoSession)
            }
        }
    }

    async fn dispatch_ciphertext(&mut self, peer: &PeerName, payload: pm_proto::CiphertextPayload) -> Result<(), CoreError> {
        self.log.append(&self.username, peer.as_str(), &payload.nonce, &payload.ct)?;
        let value = serde_json::to_value(InnerPayload::Ciphertext(payload)).expect("CiphertextPayload always serializes");
        self.relay.send_to(peer.as_str(), value).await
    }

    async fn flush_pending(&mut self, peer: &PeerName, queued: Vec<String>) -> Result<(), CoreError> {
        for text in queued {
            match channel::encrypt(&self.table, peer, text.as_bytes())? {
                EncryptOutcome::Ready(payload) => self.dispatch_ciphertext(peer, payload).await?,
                EncryptOutcome::NoSession => unreachable!("just installed this session as Established"),
            }
        }
        Ok(())
    }

    /// Process exactly one inbound frame. Returns `false` once the
    /// transport has closed. Exposed alongside [`Client::run`] for
    /// embedders (and tests) that want to single-step the event loop.
    pub async fn tick(&mut self) -> Result<bool, CoreError> {
        match self.relay.recv().await? {
            None => Ok(false),
            Some(frame) => {
                self.handle_frame(frame).await?;
                Ok(true)
            }
        }
    }

    /// Drive the event loop until the transport closes, processing exactly
    /// one inbound frame at a time, in arrival order.
    pub async fn run(&mut self) -> Result<(), CoreError> {
        while self.tick().await? {}
        Ok(())
    }

    async fn handle_frame(&mut self, frame: ServerFrame) -> Result<(), CoreError> {
        match frame {
            ServerFrame::Relay { from, payload } => self.handle_relay_payload(from, payload).await,
            ServerFrame::UserList { users } => {
                self.sink.emit(Event::UserList { users }).await;
                Ok(())
            }
            ServerFrame::Error { message } => {
                self.sink.emit(Event::SystemError { message }).await;
                Ok(())
            }
        }
    }

    async fn handle_relay_payload(&mut self, from: String, payload: Value) -> Result<(), CoreError> {
        let inner = match InnerPayload::from_json(payload) {
            Ok(inner) => inner,
            Err(e) => {
                tracing::warn!(peer = %from, error = %e, "dropping malformed relayed payload");
                return Ok(());
            }
        };
        let sender = PeerName::from(from);
        match inner {
            InnerPayload::HandshakeInit(flight) => self.handle_handshake_init(sender, flight).await,
            InnerPayload::Handshake(flight) => self.handle_handshake_reply(sender, flight).await,
            InnerPayload::Ciphertext(payload) => self.handle_ciphertext(sender, payload).await,
        }
    }

    async fn handle_handshake_init(&mut self, sender: PeerName, flight: pm_proto::HandshakeFlight) -> Result<(), CoreError> {
        match handshake::handle_init(&self.identity, &mut self.table, &self.username, &sender, &flight) {
            InitOutcome::Rejected(e) => {
                tracing::warn!(peer = %sender, error = %e, "rejected handshake_init");
                Ok(())
            }
            InitOutcome::Ignored => {
                tracing::debug!(peer = %sender, "ignoring concurrent handshake_init: lost peer-name tie-break, staying InitiatorPending");
                Ok(())
            }
            InitOutcome::Established { reply, flushed } => {
                let value = serde_json::to_value(InnerPayload::Handshake(reply)).expect("HandshakeFlight always serializes");
                self.relay.send_to(sender.as_str(), value).await?;
                self.sink.emit(Event::HandshakeSuccess { peer: sender.to_string() }).await;
                self.flush_pending(&sender, flushed).await
            }
        }
    }

    async fn handle_handshake_reply(&mut self, sender: PeerName, flight: pm_proto::HandshakeFlight) -> Result<(), CoreError> {
        match handshake::handle_reply(&mut self.table, &self.username, &sender, &flight) {
            ReplyOutcome::Rejected(e) => {
                tracing::warn!(peer = %sender, error = %e, "rejected handshake reply");
                Ok(())
            }
            ReplyOutcome::Dropped => {
                tracing::debug!(peer = %sender, "dropping unsolicited handshake reply");
                Ok(())
            }
            ReplyOutcome::Established { flushed } => {
                self.sink.emit(Event::HandshakeSuccess { peer: sender.to_string() }).await;
                self.flush_pending(&sender, flushed).await
            }
        }
    }

    async fn handle_ciphertext(&mut self, sender: PeerName, payload: pm_proto::CiphertextPayload) -> Result<(), CoreError> {
        match channel::decrypt(&self.table, &sender, &payload)? {
            DecryptOutcome::NoSession => {
                tracing::warn!(peer = %sender, "dropping ciphertext: no established session");
                Ok(())
            }
            DecryptOutcome::AuthFailed => {
                tracing::warn!(peer = %sender, "AEAD authentication failed, dropping");
                Ok(())
            }
            DecryptOutcome::Malformed => {
                tracing::warn!(peer = %sender, "decrypted payload was not valid UTF-8, dropping");
                Ok(())
            }
            DecryptOutcome::Message(text) => {
                self.log.append(sender.as_str(), &self.username, &payload.nonce, &payload.ct)?;
                self.sink.emit(Event::Message { from: sender.to_string(), text }).await;
                Ok(())
            }
        }
    }
}
