//! Broker wire protocol: the outermost JSON envelope exchanged with the
//! untrusted relay over a duplex WebSocket text-frame transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames sent from this client to the broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Register { username: String },
    Relay { to: String, payload: Value },
}

/// Frames received from the broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Relay { from: String, payload: Value },
    UserList { users: Vec<String> },
    Error { message: String },
}
