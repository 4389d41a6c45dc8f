//! Per-peer session state.
//!
//! The whole table lives on a single task — there is exactly one mutator,
//! the event loop in [`crate::client::Client::run`] — so no interior
//! mutability or locking is needed anywhere in this module.

use std::collections::{HashMap, VecDeque};

use x25519_dalek::EphemeralSecret;

use crate::peer::PeerName;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    None,
    InitiatorPending,
    /// Reachable in the data model, not in the two-flight protocol: a
    /// responder installs an established key in the same step it would
    /// otherwise park here, so no code path ever leaves a session sitting
    /// in this state.
    ResponderPending,
    Established,
}

/// One peer's session record.
pub struct Session {
    state: SessionState,
    own_ephemeral: Option<EphemeralSecret>,
    symmetric_key: Option<[u8; 32]>,
    pending_outbound: VecDeque<String>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SessionState::None,
            own_ephemeral: None,
            symmetric_key: None,
            pending_outbound: VecDeque::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }
}

/// The full set of peer sessions this process holds.
#[derive(Default)]
pub struct SessionTable {
    sessions: HashMap<PeerName, Session>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self { sessions: HashMap::new() }
    }

    fn entry(&mut self, peer: &PeerName) -> &mut Session {
        self.sessions.entry(peer.clone()).or_insert_with(Session::new)
    }

    pub fn state(&self, peer: &PeerName) -> SessionState {
        self.sessions.get(peer).map(|s| s.state).unwrap_or(SessionState::None)
    }

    /// Start (or restart) an initiator-side handshake, storing the fresh
    /// ephemeral secret we'll need once the reply arrives. Overwrites
    /// whatever ephemeral secret was already parked here: re-initiating
    /// always supersedes a prior pending attempt to the same peer.
    pub fn begin_initiator_pending(&mut self, peer: PeerName, ephemeral: EphemeralSecret) {
        let session = self.entry(&peer);
        session.state = SessionState::InitiatorPending;
        session.own_ephemeral = Some(ephemeral);
    }

    /// Take back the ephemeral secret stashed by `begin_initiator_pending`,
    /// if the session is still waiting for exactly that reply. Consumes it
    /// from the table either way a caller asks — the secret is single-use.
    pub fn take_initiator_ephemeral(&mut self, peer: &PeerName) -> Option<EphemeralSecret> {
        let session = self.sessions.get_mut(peer)?;
        if session.state != SessionState::InitiatorPending {
            return None;
        }
        session.own_ephemeral.take()
    }

    /// Install a freshly derived session key, moving the session to
    /// `Established` and returning any plaintext queued while it was
    /// pending, in enqueue order, for the caller to flush.
    pub fn install_established(&mut self, peer: PeerName, key: [u8; 32]) -> Vec<String> {
        let session = self.entry(&peer);
        session.state = SessionState::Established;
        session.own_ephemeral = None;
        session.symmetric_key = Some(key);
        session.pending_outbound.drain(..).collect()
    }

    pub fn established_key(&self, peer: &PeerName) -> Option<[u8; 32]> {
        let session = self.sessions.get(peer)?;
        if session.state != SessionState::Established {
            return None;
        }
        session.symmetric_key
    }

    pub fn has_established(&self, peer: &PeerName) -> bool {
        self.established_key(peer).is_some()
    }

    /// Queue a plaintext message for delivery once the session with `peer`
    /// reaches `Established`.
    pub fn enqueue_outbound(&mut self, peer: PeerName, plaintext: String) {
        self.entry(&peer).pending_outbound.push_back(plaintext);
    }

    /// Evict `peer`'s session record entirely, dropping any ephemeral
    /// secret, symmetric key, and queued plaintext it held. Used to forget a
    /// peer outright rather than merely resetting it to `None` with an
    /// empty record still sitting in the map.
    pub fn remove(&mut self, peer: &PeerName) -> Option<Session> {
        self.sessions.remove(peer)
    }
}
