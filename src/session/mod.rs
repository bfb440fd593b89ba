//! Per-connection session coordinator.
//!
//! Binds one connection to one participant slot: looks the room up, joins it, interprets the
//! client's messages until the connection goes away, then leaves the room exactly once.

use crate::connection::{BoxedSink, Inbound, StreamAdapter};
use crate::error::RoomError;
use crate::message::ClientMessage;
use crate::registry::RoomRegistry;
use crate::response::ServerMessage;
use crate::room::{JoinRejected, Room};
use crate::utils::{new_participant_id, ParticipantId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The addressed room does not exist; the client got a notice and the connection closed.
    RoomNotFound,
    /// The room refused the join; the client got an error notice and the connection closed.
    Rejected(RoomError),
    /// The participant joined and later disconnected.
    Disconnected,
    /// The participant joined and went silent for longer than the idle timeout.
    IdleTimeout,
}

#[derive(Clone)]
pub struct Coordinator {
    registry: Arc<RoomRegistry>,
    idle_timeout: Option<Duration>,
}

impl Coordinator {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Coordinator {
            registry,
            idle_timeout: None,
        }
    }

    /// Bounds how long a connection may stay silent. `None` or zero disables the bound.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout.filter(|d| !d.is_zero());
        self
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Runs a whole session for `player_name` on room `code`.
    pub async fn handle_stream<S>(
        &self,
        code: &str,
        player_name: &str,
        stream: &mut S,
        mut sink: BoxedSink,
    ) -> SessionEnd
    where
        S: StreamAdapter + ?Sized,
    {
        let Some(room) = self.registry.get(code) else {
            tracing::debug!(room = %code, "connection for unknown room");
            let _ = sink.send(ServerMessage::RoomNotFound).await;
            let _ = sink.close().await;
            return SessionEnd::RoomNotFound;
        };

        let id = new_participant_id();
        if let Err(JoinRejected { error, mut sink }) = room
            .add_participant(id, player_name.to_string(), sink)
            .await
        {
            tracing::info!(room = %code, participant = %id, reason = %error, "join rejected");
            // a room reaped between lookup and join reads as unknown
            let (notice, end) = match error {
                RoomError::RoomNotFound => (ServerMessage::RoomNotFound, SessionEnd::RoomNotFound),
                error => (
                    ServerMessage::Error(error.to_string()),
                    SessionEnd::Rejected(error),
                ),
            };
            let _ = sink.send(notice).await;
            let _ = sink.close().await;
            return end;
        }

        let end = self.receive_loop(&room, id, stream).await;

        room.remove_participant(id).await;
        tracing::debug!(room = %code, participant = %id, end = ?end, "session closed");
        end
    }

    async fn receive_loop<S>(&self, room: &Room, id: ParticipantId, stream: &mut S) -> SessionEnd
    where
        S: StreamAdapter + ?Sized,
    {
        loop {
            let next = match self.idle_timeout {
                Some(limit) => match time::timeout(limit, stream.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::info!(room = %room.code(), participant = %id, "idle timeout");
                        return SessionEnd::IdleTimeout;
                    }
                },
                None => stream.next().await,
            };

            match next {
                Ok(Inbound::Message(message)) => {
                    dispatch(room, id, message).await;
                    room.broadcast_roster().await;
                }
                Ok(Inbound::Heartbeat) => {}
                Err(e) if e.is_recoverable() => {
                    tracing::debug!(room = %room.code(), participant = %id, error = %e, "rejected message");
                    room.send_to(id, ServerMessage::Error(e.to_string())).await;
                }
                Err(e) => {
                    tracing::debug!(room = %room.code(), participant = %id, error = %e, "connection lost");
                    return SessionEnd::Disconnected;
                }
            }
        }
    }
}

async fn dispatch(room: &Room, id: ParticipantId, message: ClientMessage) {
    match message {
        ClientMessage::Ready => {
            room.mark_ready(id).await;
        }
        ClientMessage::Start => {
            room.attempt_start().await;
        }
    }
}
