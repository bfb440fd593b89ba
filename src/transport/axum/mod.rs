use crate::connection::{Inbound, SinkAdapter, StreamAdapter};
use crate::error::ConnectionError;
use crate::message::ClientMessage;
use crate::response::ServerMessage;
use crate::session::{Coordinator, SessionEnd};
use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

/// Normal closure status code.
const CLOSE_NORMAL: u16 = 1000;

pub struct AxumWsSink {
    sink: SplitSink<WebSocket, Message>,
}

#[async_trait]
impl SinkAdapter for AxumWsSink {
    async fn send(&mut self, message: ServerMessage) -> Result<(), ConnectionError> {
        let text = message
            .to_text()
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), ConnectionError> {
        let frame = CloseFrame {
            code: CLOSE_NORMAL,
            reason: "".into(),
        };
        self.sink
            .send(Message::Close(Some(frame)))
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }
}

pub struct AxumWsStream {
    stream: SplitStream<WebSocket>,
}

#[async_trait]
impl StreamAdapter for AxumWsStream {
    async fn next(&mut self) -> Result<Inbound, ConnectionError> {
        let message = match self.stream.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => return Err(ConnectionError::Transport(e.to_string())),
            None => return Err(ConnectionError::Closed),
        };

        match message {
            Message::Text(text) => ClientMessage::parse(text.as_str()).map(Inbound::Message),
            Message::Binary(_) => Err(ConnectionError::InvalidMessage(
                "binary frames are not supported".to_string(),
            )),
            Message::Close(_) => Err(ConnectionError::Closed),
            // axum answers pings itself
            Message::Ping(_) | Message::Pong(_) => Ok(Inbound::Heartbeat),
        }
    }
}

/// Runs a coordinator session over an upgraded axum websocket.
pub async fn serve_socket(
    socket: WebSocket,
    coordinator: Coordinator,
    code: String,
    player_name: String,
) -> SessionEnd {
    let (sink, stream) = socket.split();

    let mut stream = AxumWsStream { stream };
    let sink = AxumWsSink { sink };

    coordinator
        .handle_stream(&code, &player_name, &mut stream, Box::new(sink))
        .await
}
