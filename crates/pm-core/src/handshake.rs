//! The two-flight signed handshake: `handshake_init` from the initiator,
//! `handshake` in reply from the responder. Both flights carry the
//! sender's long-term identity key, a fresh X25519 ephemeral key, and an
//! Ed25519 signature over the raw ephemeral bytes.
//!
//! Functions here are deliberately free of I/O: they take the pieces of
//! state they need, return a small outcome enum, and leave sending frames,
//! emitting sink events, and appending to the message log to
//! [`crate::client::Client`].

use pm_crypto::{ephemeral, kdf, Identity, IdentityPublicKey};
use pm_proto::HandshakeFlight;

use crate::error::CoreError;
use crate::peer::PeerName;
use crate::session::{SessionState, SessionTable};

pub struct Initiated {
    pub flight: HandshakeFlight,
}

/// Start a handshake with `peer`, always overwriting any prior pending
/// state for that peer (re-initiation just supersedes it).
pub fn initiate(identity: &Identity, table: &mut SessionTable, peer: PeerName) -> Initiated {
    let keypair = ephemeral::generate();
    let sig = identity.sign(&keypair.public);
    table.begin_initiator_pending(peer, keypair.secret);
    Initiated {
        flight: HandshakeFlight::new(identity.public().as_bytes(), &keypair.public, &sig),
    }
}

fn verify_flight(flight: &HandshakeFlight) -> Result<(IdentityPublicKey, [u8; 32]), CoreError> {
    let decoded = flight.decode()?;
    let sender_identity = IdentityPublicKey::from_bytes(&decoded.identity)?;
    Identity::verify(&sender_identity, &decoded.ephemeral, &decoded.sig)
        .map_err(|_| CoreError::InvalidSignature)?;
    Ok((sender_identity, decoded.ephemeral))
}

pub enum InitOutcome {
    /// Signature failed to verify; the frame is dropped and logged by the caller.
    Rejected(CoreError),
    /// We are concurrently initiating our own handshake to `sender` and lose
    /// the deterministic tie-break (our name sorts after theirs): ignore
    /// their `handshake_init` and stay `InitiatorPending`, completing later
    /// via [`handle_reply`] to their reply instead.
    Ignored,
    /// We replied and the session is now established. `flushed` is any
    /// plaintext the local user queued for this peer before the handshake
    /// completed.
    Established { reply: HandshakeFlight, flushed: Vec<String> },
}

/// Handle an inbound `handshake_init`.
///
/// Under concurrent initiation (both sides call `initiate_handshake` before
/// either reply arrives) both peers receive a `handshake_init` while already
/// `InitiatorPending`. Letting both sides unconditionally answer as
/// responder derives two different keys — each side combines its own fresh
/// responder ephemeral with the *other* side's original ephemeral, so
/// `DH(esk_A2, epk_B1) != DH(esk_B2, epk_A1)`. Instead we break the tie on
/// `PeerName` ordering: only the lexicographically smaller of `self_name`
/// and `sender` acts as responder here; the larger one ignores this frame
/// and stays `InitiatorPending`, so it completes as initiator once the
/// smaller side's reply arrives — both sides then derive from the same
/// `(initiator_ephemeral, responder_ephemeral)` pair.
pub fn handle_init(
    identity: &Identity,
    table: &mut SessionTable,
    self_name: &str,
    sender: &PeerName,
    flight: &HandshakeFlight,
) -> InitOutcome {
    let (_sender_identity, peer_ephemeral) = match verify_flight(flight) {
        Ok(v) => v,
        Err(e) => return InitOutcome::Rejected(e),
    };

    if table.state(sender) == SessionState::InitiatorPending && self_name > sender.as_str() {
        return InitOutcome::Ignored;
    }

    let keypair = ephemeral::generate();
    let sig = identity.sign(&keypair.public);
    let reply = HandshakeFlight::new(identity.public().as_bytes(), &keypair.public, &sig);

    let shared = ephemeral::diffie_hellman(keypair.secret, &peer_ephemeral);
    let info = kdf::session_info(self_name, sender.as_str());
    let key = match kdf::derive(&shared, &info) {
        Ok(k) => k,
        Err(e) => return InitOutcome::Rejected(e.into()),
    };

    let flushed = table.install_established(sender.clone(), key);
    InitOutcome::Established { reply, flushed }
}

pub enum ReplyOutcome {
    Rejected(CoreError),
    /// We were not waiting for a reply from this sender (no matching
    /// `InitiatorPending` session); the frame is silently dropped.
    Dropped,
    Established { flushed: Vec<String> },
}

/// Handle an inbound `handshake` reply to our own earlier `handshake_init`.
pub fn handle_reply(
    table: &mut SessionTable,
    self_name: &str,
    sender: &PeerName,
    flight: &HandshakeFlight,
) -> ReplyOutcome {
    let (_sender_identity, peer_ephemeral) = match verify_flight(flight) {
        Ok(v) => v,
        Err(e) => return ReplyOutcome::Rejected(e),
    };

    let Some(own_ephemeral) = table.take_initiator_ephemeral(sender) else {
        return ReplyOutcome::Dropped;
    };

    let shared = ephemeral::diffie_hellman(own_ephemeral, &peer_ephemeral);
    let info = kdf::session_info(self_name, sender.as_str());
    let key = match kdf::derive(&shared, &info) {
        Ok(k) => k,
        Err(e) => return ReplyOutcome::Rejected(e.into()),
    };

    let flushed = table.install_established(sender.clone(), key);
    ReplyOutcome::Established { flushed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn identity() -> Identity {
        let dir = tempdir().unwrap();
        Identity::load_or_create(dir.path().join("id.pem")).unwrap()
    }

    #[test]
    fn full_handshake_converges_on_same_key() {
        let alice = identity();
        let bob = identity();
        let mut alice_table = SessionTable::new();
        let mut bob_table = SessionTable::new();

        let init = initiate(&alice, &mut alice_table, PeerName::from("bob"));

        let reply = match handle_init(&bob, &mut bob_table, "bob", &PeerName::from("alice"), &init.flight) {
            InitOutcome::Established { reply, flushed } => {
                assert!(flushed.is_empty());
                reply
            }
            InitOutcome::Rejected(e) => panic!("bob rejected: {e}"),
            InitOutcome::Ignored => panic!("bob was not concurrently initiating, must not ignore"),
        };

        match handle_reply(&mut alice_table, "alice", &PeerName::from("bob"), &reply) {
            ReplyOutcome::Established { flushed } => assert!(flushed.is_empty()),
            _ => panic!("alice did not establish"),
        }

        let alice_key = alice_table.established_key(&PeerName::from("bob")).unwrap();
        let bob_key = bob_table.established_key(&PeerName::from("alice")).unwrap();
        assert_eq!(alice_key, bob_key);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let alice = identity();
        let bob = identity();
        let mut alice_table = SessionTable::new();
        let mut bob_table = SessionTable::new();

        let init = initiate(&alice, &mut alice_table, PeerName::from("bob"));
        let mut tampered = init.flight;
        let mut ephemeral_bytes = pm_proto::codec::decode(&tampered.ephemeral).unwrap();
        ephemeral_bytes[0] ^= 0x01;
        tampered.ephemeral = pm_proto::codec::encode(&ephemeral_bytes);

        match handle_init(&bob, &mut bob_table, "bob", &PeerName::from("alice"), &tampered) {
            InitOutcome::Rejected(_) => {}
            InitOutcome::Established { .. } => panic!("tampered handshake must not establish"),
            InitOutcome::Ignored => panic!("bob was not concurrently initiating, must not ignore"),
        }
    }

    #[test]
    fn reply_without_pending_initiation_is_dropped() {
        let bob = identity();
        let mut bob_table = SessionTable::new();
        let init = initiate(&bob, &mut SessionTable::new(), PeerName::from("alice"));
        match handle_reply(&mut bob_table, "bob", &PeerName::from("alice"), &init.flight) {
            ReplyOutcome::Dropped => {}
            _ => panic!("expected drop: no prior InitiatorPending session"),
        }
    }

    #[test]
    fn concurrent_initiation_converges_via_peer_name_tie_break() {
        let alice = identity();
        let bob = identity();
        let mut alice_table = SessionTable::new();
        let mut bob_table = SessionTable::new();

        // Both sides initiate before either reply arrives.
        let alice_init = initiate(&alice, &mut alice_table, PeerName::from("bob"));
        let bob_init = initiate(&bob, &mut bob_table, PeerName::from("alice"));

        // "alice" < "bob", so bob (the larger name) ignores alice's init and
        // stays InitiatorPending; alice (the smaller name) answers as
        // responder and establishes immediately.
        match handle_init(&bob, &mut bob_table, "bob", &PeerName::from("alice"), &alice_init.flight) {
            InitOutcome::Ignored => {}
            _ => panic!("bob must ignore alice's init and stay InitiatorPending"),
        }
        let reply = match handle_init(&alice, &mut alice_table, "alice", &PeerName::from("bob"), &bob_init.flight) {
            InitOutcome::Established { reply, .. } => reply,
            InitOutcome::Rejected(e) => panic!("alice rejected: {e}"),
            InitOutcome::Ignored => panic!("alice must not ignore: she is the smaller name"),
        };

        match handle_reply(&mut bob_table, "bob", &PeerName::from("alice"), &reply) {
            ReplyOutcome::Established { .. } => {}
            _ => panic!("bob did not complete as initiator"),
        }

        let alice_key = alice_table.established_key(&PeerName::from("bob")).unwrap();
        let bob_key = bob_table.established_key(&PeerName::from("alice")).unwrap();
        assert_eq!(alice_key, bob_key);
    }

    #[test]
    fn queued_outbound_is_flushed_on_establish() {
        let alice = identity();
        let bob = identity();
        let mut alice_table = SessionTable::new();
        let mut bob_table = SessionTable::new();
        bob_table.enqueue_outbound(PeerName::from("alice"), "queued for alice".into());

        let init = initiate(&alice, &mut alice_table, PeerName::from("bob"));
        match handle_init(&bob, &mut bob_table, "bob", &PeerName::from("alice"), &init.flight) {
            InitOutcome::Established { flushed, .. } => {
                assert_eq!(flushed, vec!["queued for alice".to_string()]);
            }
            InitOutcome::Rejected(e) => panic!("bob rejected: {e}"),
            InitOutcome::Ignored => panic!("bob was not concurrently initiating, must not ignore"),
        }
    }
}
