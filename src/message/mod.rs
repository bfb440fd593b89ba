
use crate::error::ConnectionError;
use serde::{Deserialize, Serialize};

/// Inbound client message, tagged by its `type` field.
///
/// ```rust
/// use blanco::message::ClientMessage;
///
/// let message = ClientMessage::parse(r#"{"type": "ready"}"#).unwrap();
/// assert_eq!(message, ClientMessage::Ready);
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The participant signals readiness. Idempotent.
    Ready,
    /// The participant asks the room to start; a no-op below quorum or once started.
    Start,
}

impl ClientMessage {
    /// Parses a text frame. Unknown tags and malformed JSON are reported as
    /// [`ConnectionError::InvalidMessage`].
    pub fn parse(text: &str) -> Result<Self, ConnectionError> {
        Ok(serde_json::from_str(text)?)
    }
}
