//! Transport capabilities used by the coordinator.
//!
//! A room only ever sees a participant as a [`SinkAdapter`]; the session that accepted the
//! connection owns the matching [`StreamAdapter`].
#[cfg(test)]
pub(crate) mod mock;

use crate::error::ConnectionError;
use crate::message::ClientMessage;
use crate::response::ServerMessage;
use async_trait::async_trait;

/// Outbound half of a participant connection.
#[async_trait]
pub trait SinkAdapter: Send {
    async fn send(&mut self, message: ServerMessage) -> Result<(), ConnectionError>;

    /// Closes the outbound half. Transports without a close handshake can rely on the default.
    async fn close(&mut self) -> Result<(), ConnectionError> {
        Ok(())
    }
}

/// One inbound frame as seen by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    Message(ClientMessage),
    /// Transport-level keepalive (ping/pong). Carries no message but counts as activity.
    Heartbeat,
}

/// Inbound half of a participant connection.
#[async_trait]
pub trait StreamAdapter: Send {
    /// Waits for the next inbound frame.
    ///
    /// Returns [`ConnectionError::InvalidMessage`] for a frame that could not be understood and
    /// any other error once the connection is gone.
    async fn next(&mut self) -> Result<Inbound, ConnectionError>;
}

pub type BoxedSink = Box<dyn SinkAdapter>;
