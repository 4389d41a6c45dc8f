//! The seam between the session core and whatever actually talks to the
//! broker. Kept as a trait so `pm-core` has no dependency on the transport
//! crate: `pm-relay` depends on `pm-core` and implements this, not the
//! other way around.

use async_trait::async_trait;
use pm_proto::ServerFrame;
use serde_json::Value;

use crate::error::CoreError;

#[async_trait]
pub trait Relay: Send {
    /// Send `payload` addressed to `to`, wrapped in the broker's relay
    /// envelope by the implementation.
    async fn send_to(&mut self, to: &str, payload: Value) -> Result<(), CoreError>;

    /// Wait for the next frame from the broker. `Ok(None)` means the
    /// connection closed cleanly and the event loop should stop.
    async fn recv(&mut self) -> Result<Option<ServerFrame>, CoreError>;
}
