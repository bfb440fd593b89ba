//! HTTP collaborator: room creation, room info and the websocket entry point.

use crate::config::Config;
use crate::error::{ApiError, RoomError};
use crate::registry::RoomRegistry;
use crate::room::{Room, RoomSnapshot};
use crate::session::Coordinator;
use crate::transport::axum::serve_socket;
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use url::Url;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let registry = Arc::new(RoomRegistry::new().with_max_capacity(config.max_capacity));
        Self::with_registry(config, registry)
    }

    pub fn with_registry(config: Config, registry: Arc<RoomRegistry>) -> Self {
        let coordinator = Coordinator::new(registry).with_idle_timeout(config.idle_timeout);
        AppState {
            coordinator,
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &Arc<RoomRegistry> {
        self.coordinator.registry()
    }
}

/// Query string of the form-driven `GET /create_room`.
#[derive(Debug, Deserialize)]
pub struct CreateRoomQuery {
    pub room_name: String,
    pub max_players: usize,
    #[serde(default)]
    pub player_name: Option<String>,
}

/// JSON body of `POST /rooms`.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    pub capacity: usize,
    #[serde(default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedRoom {
    pub code: String,
    pub name: String,
    pub capacity: usize,
    /// Websocket path for the creating player, when a player name was given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_url: Option<String>,
}

impl CreatedRoom {
    fn new(room: &Room, player_name: Option<&str>) -> Self {
        CreatedRoom {
            code: room.code().to_string(),
            name: room.name().to_string(),
            capacity: room.capacity(),
            join_url: player_name.and_then(|player| join_path(room.code(), player)),
        }
    }
}

/// Websocket path a player uses to join room `code`, with each segment percent-encoded.
pub fn join_path(code: &str, player_name: &str) -> Option<String> {
    let mut url = Url::parse("ws://localhost").ok()?;
    url.path_segments_mut()
        .ok()?
        .clear()
        .push("ws")
        .push(code)
        .push(player_name);
    Some(url.path().to_string())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/create_room", get(create_room_from_query))
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(room_info))
        .route("/ws/{code}/{player_name}", get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn create(
    state: &AppState,
    name: &str,
    capacity: usize,
    player_name: Option<&str>,
) -> Result<CreatedRoom, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("room name must not be empty"));
    }
    let player_name = player_name.map(str::trim).filter(|p| !p.is_empty());

    let room = state.registry().create(name, capacity)?;
    Ok(CreatedRoom::new(&room, player_name))
}

async fn create_room_from_query(
    State(state): State<AppState>,
    Query(query): Query<CreateRoomQuery>,
) -> Result<Json<CreatedRoom>, ApiError> {
    create(
        &state,
        &query.room_name,
        query.max_players,
        query.player_name.as_deref(),
    )
    .map(Json)
}

async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<CreatedRoom>, ApiError> {
    create(
        &state,
        &request.name,
        request.capacity,
        request.player_name.as_deref(),
    )
    .map(Json)
}

async fn room_info(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    let room = state.registry().get(&code).ok_or(RoomError::RoomNotFound)?;
    Ok(Json(room.snapshot().await))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path((code, player_name)): Path<(String, String)>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        serve_socket(socket, state.coordinator, code, player_name).await;
    })
}

/// Periodically drops empty rooms idle for longer than `ttl`.
pub fn spawn_reaper(registry: Arc<RoomRegistry>, ttl: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            registry.reap_idle(ttl);
        }
    })
}
