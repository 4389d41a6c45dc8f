//! The event sink: how the core tells an embedder what happened, without
//! knowing whether the embedder is a terminal, a GUI, or a test harness.

use async_trait::async_trait;

/// Something the embedder may want to show a user or log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    HandshakeSuccess { peer: String },
    Message { from: String, text: String },
    UserList { users: Vec<String> },
    SystemError { message: String },
}

/// A synchronous sink, for embedders that don't need to await (e.g. a
/// terminal that just prints).
pub trait EventSink: Send {
    fn emit(&mut self, event: Event);
}

/// An async sink, for embedders that forward events across a channel or an
/// IPC boundary.
#[async_trait]
pub trait AsyncEventSink: Send {
    async fn emit(&mut self, event: Event);
}

/// Unifies both sink flavors behind one type the client can hold without a
/// generic parameter.
pub enum SinkHandle {
    Sync(Box<dyn EventSink>),
    Async(Box<dyn AsyncEventSink>),
}

impl SinkHandle {
    pub async fn emit(&mut self, event: Event) {
        match self {
            SinkHandle::Sync(sink) => sink.emit(event),
            SinkHandle::Async(sink) => sink.emit(event).await,
        }
    }
}
