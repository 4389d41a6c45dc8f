//! pm-relay — the WebSocket adapter between the session core and the
//! untrusted broker.
//!
//! Implements [`pm_core::Relay`] over a single `tokio-tungstenite` duplex
//! connection: JSON text frames in, JSON text frames out. Reconnects lazily
//! on the next send if the socket has dropped; a dropped connection does not
//! try to resume any handshake that was mid-flight, matching the core's
//! "complete or abandoned" reconnection policy.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use pm_core::{CoreError, Relay};
use pm_proto::wire::{ClientFrame, ServerFrame};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection state, mirrored explicitly even though `Option<WsStream>`
/// would carry the same information — the two named states are what the
/// design talks about, so the code should too.
enum State {
    Disconnected,
    Connected(WsStream),
}

/// A [`Relay`] backed by a WebSocket connection to the broker, identified
/// by `url` and registered under `username`.
pub struct WsRelay {
    url: String,
    username: String,
    state: State,
}

impl WsRelay {
    pub fn new(url: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            state: State::Disconnected,
        }
    }

    /// Returns the live connection, opening one and replaying the
    /// mandatory `register` frame first if there isn't one.
    async fn ensure_connected(&mut self) -> Result<&mut WsStream, CoreError> {
        if matches!(self.state, State::Disconnected) {
            let (mut stream, _response) = connect_async(self.url.as_str())
                .await
                .map_err(|e| CoreError::Transport(format!("connect to {}: {e}", self.url)))?;
            let register = ClientFrame::Register { username: self.username.clone() };
            let text = serde_json::to_string(&register).expect("ClientFrame always serializes");
            stream
                .send(Message::Text(text))
                .await
                .map_err(|e| CoreError::Transport(format!("register send: {e}")))?;
            self.state = State::Connected(stream);
            tracing::info!(url = %self.url, username = %self.username, "connected to broker");
        }
        match &mut self.state {
            State::Connected(stream) => Ok(stream),
            State::Disconnected => unreachable!("just connected above"),
        }
    }
}

#[async_trait]
impl Relay for WsRelay {
    async fn send_to(&mut self, to: &str, payload: Value) -> Result<(), CoreError> {
        let frame = ClientFrame::Relay { to: to.to_string(), payload };
        let text = serde_json::to_string(&frame).expect("ClientFrame always serializes");

        let stream = self.ensure_connected().await?;
        if stream.send(Message::Text(text.clone())).await.is_ok() {
            return Ok(());
        }

        // The socket we had is dead; reconnect once and retry exactly once.
        tracing::warn!(peer = %to, "send failed on existing connection, reconnecting");
        self.state = State::Disconnected;
        let stream = self.ensure_connected().await?;
        stream
            .send(Message::Text(text))
            .await
            .map_err(|e| CoreError::Transport(format!("send after reconnect: {e}")))
    }

    async fn recv(&mut self) -> Result<Option<ServerFrame>, CoreError> {
        loop {
            let stream = self.ensure_connected().await?;
            match stream.next().await {
                None => {
                    self.state = State::Disconnected;
                    return Ok(None);
                }
                Some(Err(e)) => {
                    self.state = State::Disconnected;
                    return Err(CoreError::Transport(format!("read: {e}")));
                }
                Some(Ok(Message::Close(_))) => {
                    self.state = State::Disconnected;
                    return Ok(None);
                }
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ServerFrame>(&text) {
                    Ok(frame) => return Ok(Some(frame)),
                    Err(e) => {
                        tracing::warn!(error = %e, "dropping malformed broker frame");
                        continue;
                    }
                },
                // Ping/pong are answered by tungstenite itself; binary frames
                // are not part of this protocol and are ignored.
                Some(Ok(_)) => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt as _;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    /// Spins up a single-shot mock broker: accepts one connection, expects
    /// the mandatory `register` frame, then echoes back one `user_list`.
    async fn mock_broker() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            let register = ws.next().await.unwrap().unwrap();
            let parsed: ClientFrame = match register {
                Message::Text(t) => serde_json::from_str(&t).unwrap(),
                _ => panic!("expected text frame"),
            };
            assert!(matches!(parsed, ClientFrame::Register { username } if username == "alice"));
            let user_list = serde_json::json!({"type": "user_list", "users": ["alice"]});
            ws.send(Message::Text(user_list.to_string())).await.unwrap();
        });
        format!("ws://{addr}")
    }

    #[tokio::test]
    async fn registers_on_first_send_and_parses_reply() {
        let url = mock_broker().await;
        let mut relay = WsRelay::new(url, "alice");
        let frame = relay.recv().await.unwrap().expect("user_list frame");
        assert!(matches!(frame, ServerFrame::UserList { users } if users == vec!["alice".to_string()]));
    }
}
