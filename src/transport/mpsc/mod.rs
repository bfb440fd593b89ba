/// Provides a transport using Tokio MPSC (Multi-Producer, Single-Consumer) channels.
///
/// This is useful for in-process communication or testing where network connections are not required.
mod test;

use crate::connection::{Inbound, SinkAdapter, StreamAdapter};
use crate::error::ConnectionError;
use crate::message::ClientMessage;
use crate::response::ServerMessage;
use crate::session::{Coordinator, SessionEnd};
use async_trait::async_trait;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;

/// An implementation of [`SinkAdapter`] that sends messages over a `tokio::sync::mpsc::Sender`.
#[derive(Clone)]
pub struct MpscSink {
    sender: Sender<ServerMessage>,
}

#[async_trait]
impl SinkAdapter for MpscSink {
    async fn send(&mut self, message: ServerMessage) -> Result<(), ConnectionError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| ConnectionError::Closed)
    }
}

/// An implementation of [`StreamAdapter`] that reads text frames from a
/// `tokio::sync::mpsc::Receiver`, parsing them like a websocket transport would.
pub struct MpscStream {
    receiver: Receiver<String>,
}

#[async_trait]
impl StreamAdapter for MpscStream {
    async fn next(&mut self) -> Result<Inbound, ConnectionError> {
        let text = self.receiver.recv().await.ok_or(ConnectionError::Closed)?;
        ClientMessage::parse(&text).map(Inbound::Message)
    }
}

/// Client end of an in-process connection.
///
/// Dropping `sender` is the disconnect signal.
pub struct MpscConnection {
    pub sender: Sender<String>,
    pub receiver: Receiver<ServerMessage>,
    pub session: JoinHandle<SessionEnd>,
}

impl MpscConnection {
    /// Sends a typed client message as a text frame.
    pub async fn send(&self, message: ClientMessage) -> Result<(), ConnectionError> {
        let text = serde_json::to_string(&message)
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        self.send_text(text).await
    }

    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), ConnectionError> {
        self.sender
            .send(text.into())
            .await
            .map_err(|_| ConnectionError::Closed)
    }

    /// Waits for the next server message. `None` once the session dropped its sink.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        self.receiver.recv().await
    }

    /// Drops the client's sender and waits for the session to finish its cleanup.
    pub async fn disconnect(self) -> Option<SessionEnd> {
        let MpscConnection {
            sender,
            receiver,
            session,
        } = self;
        drop(sender);
        drop(receiver);
        session.await.ok()
    }
}

/// Connects in-process clients to a [`Coordinator`] over channels.
#[derive(Clone)]
pub struct MpscTransport {
    coordinator: Coordinator,
}

impl MpscTransport {
    pub fn new(coordinator: Coordinator) -> Self {
        MpscTransport { coordinator }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Opens a connection for `player_name` to room `code`.
    ///
    /// A background task runs the session; `buffer_size` bounds both channel directions.
    pub fn connect(&self, code: &str, player_name: &str, buffer_size: usize) -> MpscConnection {
        let (msg_tx, msg_rx) = mpsc::channel(buffer_size);
        let (resp_tx, resp_rx) = mpsc::channel(buffer_size);

        let coordinator = self.coordinator.clone();
        let code = code.to_string();
        let player_name = player_name.to_string();

        let session = tokio::spawn(async move {
            let mut stream = MpscStream { receiver: msg_rx };
            let sink = MpscSink { sender: resp_tx };

            coordinator
                .handle_stream(&code, &player_name, &mut stream, Box::new(sink))
                .await
        });

        MpscConnection {
            sender: msg_tx,
            receiver: resp_rx,
            session,
        }
    }
}
