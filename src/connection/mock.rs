use crate::connection::{Inbound, SinkAdapter, StreamAdapter};
use crate::error::ConnectionError;
use crate::message::ClientMessage;
use crate::response::ServerMessage;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Sink that records everything sent to it.
#[derive(Clone, Default)]
pub(crate) struct MockSink {
    pub sent: Arc<Mutex<Vec<ServerMessage>>>,
    pub closed: Arc<AtomicBool>,
    pub broken: bool,
}

impl MockSink {
    pub fn new() -> Self {
        MockSink::default()
    }

    /// A sink whose connection is already gone.
    pub fn broken() -> Self {
        MockSink {
            broken: true,
            ..MockSink::default()
        }
    }

    pub fn messages(&self) -> Vec<ServerMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn roles(&self) -> Vec<crate::role::Role> {
        self.messages()
            .into_iter()
            .filter_map(|message| match message {
                ServerMessage::Role(role) => Some(role),
                _ => None,
            })
            .collect()
    }

    pub fn last_roster(&self) -> Option<Vec<String>> {
        self.messages()
            .into_iter()
            .rev()
            .find_map(|message| match message {
                ServerMessage::UpdatePlayers(players) => Some(players),
                _ => None,
            })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SinkAdapter for MockSink {
    async fn send(&mut self, message: ServerMessage) -> Result<(), ConnectionError> {
        if self.broken {
            return Err(ConnectionError::Closed);
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Stream that replays a fixed script and then reports the connection closed.
pub(crate) struct MockStream {
    pub script: VecDeque<Result<Inbound, ConnectionError>>,
}

impl MockStream {
    pub fn new(script: Vec<Result<ClientMessage, ConnectionError>>) -> Self {
        Self::frames(
            script
                .into_iter()
                .map(|item| item.map(Inbound::Message))
                .collect(),
        )
    }

    /// Script that may also carry heartbeats.
    pub fn frames(script: Vec<Result<Inbound, ConnectionError>>) -> Self {
        MockStream {
            script: script.into(),
        }
    }
}

#[async_trait]
impl StreamAdapter for MockStream {
    async fn next(&mut self) -> Result<Inbound, ConnectionError> {
        self.script.pop_front().unwrap_or(Err(ConnectionError::Closed))
    }
}
