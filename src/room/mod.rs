//! A single game session: membership, readiness, roles and fan-out to connected members.
//!
//! Every mutation goes through the room's mutex, so concurrent sessions on the same room are
//! serialized while different rooms never contend.

use crate::connection::BoxedSink;
use crate::error::{ConnectionError, RoomError};
use crate::response::ServerMessage;
use crate::role::{assign_roles, Role};
use crate::utils::ParticipantId;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time;

/// Quorum is reached once `connected / capacity >= 3 / 5`.
const QUORUM_NUMERATOR: usize = 3;
const QUORUM_DENOMINATOR: usize = 5;

/// Upper bound on a single outbound send made while holding the room lock.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether `connected` members are enough to start a room of `capacity`.
pub fn quorum_reached(connected: usize, capacity: usize) -> bool {
    connected > 0 && connected * QUORUM_DENOMINATOR >= capacity * QUORUM_NUMERATOR
}

struct Member {
    id: ParticipantId,
    name: String,
    sink: BoxedSink,
}

async fn deliver(sink: &mut BoxedSink, message: ServerMessage) -> Result<(), ConnectionError> {
    match time::timeout(SEND_TIMEOUT, sink.send(message)).await {
        Ok(result) => result,
        Err(_) => Err(ConnectionError::Transport("send timed out".to_string())),
    }
}

struct RoomState {
    /// Join order; doubles as the roster order.
    members: Vec<Member>,
    ready: HashSet<ParticipantId>,
    roles: HashMap<ParticipantId, Role>,
    started: bool,
    /// Set once the registry dropped this room; no further joins.
    retired: bool,
    rng: StdRng,
}

impl RoomState {
    fn roster(&self) -> Vec<String> {
        self.members.iter().map(|m| m.name.clone()).collect()
    }

    fn position(&self, id: ParticipantId) -> Option<usize> {
        self.members.iter().position(|m| m.id == id)
    }

    async fn broadcast(&mut self, code: &str, message: ServerMessage) {
        for member in self.members.iter_mut() {
            if let Err(e) = deliver(&mut member.sink, message.clone()).await {
                tracing::debug!(room = %code, participant = %member.id, error = %e, "broadcast send failed");
            }
        }
    }

    async fn broadcast_roster(&mut self, code: &str) {
        let players = self.roster();
        self.broadcast(code, ServerMessage::UpdatePlayers(players)).await;
    }
}

/// A join the room refused. Hands the sink back so the caller can notify the client.
pub struct JoinRejected {
    pub error: RoomError,
    pub sink: BoxedSink,
}

impl std::fmt::Debug for JoinRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JoinRejected")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Serializable view of a room, as served by the room-info endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub code: String,
    pub name: String,
    pub capacity: usize,
    pub started: bool,
    pub players: Vec<String>,
    pub ready: Vec<String>,
}

pub struct Room {
    code: String,
    name: String,
    capacity: usize,
    state: Mutex<RoomState>,
    created_at: Instant,
    /// Milliseconds after `created_at` of the last membership change.
    last_activity_ms: AtomicU64,
    member_count: AtomicUsize,
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl Room {
    /// Creates an empty, not yet started room. `rng` drives role assignment.
    pub fn new(code: String, name: String, capacity: usize, rng: StdRng) -> Self {
        Room {
            code,
            name,
            capacity,
            state: Mutex::new(RoomState {
                members: Vec::new(),
                ready: HashSet::new(),
                roles: HashMap::new(),
                started: false,
                retired: false,
                rng,
            }),
            created_at: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
            member_count: AtomicUsize::new(0),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Connected member count, readable without taking the room lock.
    pub fn member_count(&self) -> usize {
        self.member_count.load(Ordering::Acquire)
    }

    /// Time since the last membership change (or since creation).
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_activity_ms.load(Ordering::Acquire));
        self.created_at.elapsed().saturating_sub(last)
    }

    fn touch(&self, state: &RoomState) {
        let elapsed = self.created_at.elapsed().as_millis() as u64;
        self.last_activity_ms.store(elapsed, Ordering::Release);
        self.member_count.store(state.members.len(), Ordering::Release);
    }

    /// Retires the room if it is empty and has been idle for at least `ttl`.
    ///
    /// Decided under the room lock, so a join racing with the reaper either lands first and
    /// keeps the room alive or sees the room retired. A room whose lock is busy is kept.
    pub fn try_retire(&self, ttl: Duration) -> bool {
        let Ok(mut state) = self.state.try_lock() else {
            return false;
        };
        if state.retired {
            return true;
        }
        if !state.members.is_empty() || self.idle_for() < ttl {
            return false;
        }
        state.retired = true;
        true
    }

    /// Registers a participant, greets it privately and broadcasts the new roster.
    ///
    /// Rejected once the room is full, the game has started or the room was retired.
    pub async fn add_participant(
        &self,
        id: ParticipantId,
        name: String,
        sink: BoxedSink,
    ) -> Result<(), JoinRejected> {
        let mut state = self.state.lock().await;

        if state.retired {
            return Err(JoinRejected {
                error: RoomError::RoomNotFound,
                sink,
            });
        }
        if state.started {
            return Err(JoinRejected {
                error: RoomError::AlreadyStarted,
                sink,
            });
        }
        if state.members.len() >= self.capacity {
            return Err(JoinRejected {
                error: RoomError::CapacityExceeded {
                    capacity: self.capacity,
                },
                sink,
            });
        }

        state.members.push(Member {
            id,
            name: name.clone(),
            sink,
        });
        self.touch(&state);

        tracing::info!(
            room = %self.code,
            participant = %id,
            players = state.members.len(),
            "participant joined"
        );

        let greeting = ServerMessage::Joined {
            room: self.name.clone(),
            code: self.code.clone(),
            player: name,
        };
        if let Some(member) = state.members.last_mut() {
            if let Err(e) = deliver(&mut member.sink, greeting).await {
                tracing::debug!(room = %self.code, participant = %id, error = %e, "greeting send failed");
            }
        }

        state.broadcast_roster(&self.code).await;
        Ok(())
    }

    /// Marks a member as ready. Returns `true` only the first time for a given member.
    pub async fn mark_ready(&self, id: ParticipantId) -> bool {
        let mut state = self.state.lock().await;
        if state.position(id).is_none() {
            return false;
        }
        state.ready.insert(id)
    }

    /// Starts the game if it has not started and quorum is reached.
    ///
    /// Assigns roles over every connected member and sends each one its own role. Returns
    /// whether this call started the game; every other case is a silent no-op.
    pub async fn attempt_start(&self) -> bool {
        let mut state = self.state.lock().await;

        if state.started || !quorum_reached(state.members.len(), self.capacity) {
            return false;
        }

        let ids: Vec<ParticipantId> = state.members.iter().map(|m| m.id).collect();
        let roles = assign_roles(&ids, self.capacity, &mut state.rng);
        state.roles = roles;
        state.started = true;

        tracing::info!(
            room = %self.code,
            players = ids.len(),
            capacity = self.capacity,
            "roles assigned"
        );

        let RoomState { members, roles, .. } = &mut *state;
        for member in members.iter_mut() {
            let Some(role) = roles.get(&member.id).copied() else {
                continue;
            };
            if let Err(e) = deliver(&mut member.sink, ServerMessage::Role(role)).await {
                tracing::debug!(room = %self.code, participant = %member.id, error = %e, "role send failed");
            }
        }

        true
    }

    /// Removes a participant from every map and broadcasts the shrunk roster.
    ///
    /// Returns `false`, touching nothing, if `id` is not a member.
    pub async fn remove_participant(&self, id: ParticipantId) -> bool {
        let mut state = self.state.lock().await;

        let Some(index) = state.position(id) else {
            return false;
        };
        state.members.remove(index);
        state.ready.remove(&id);
        state.roles.remove(&id);
        self.touch(&state);

        tracing::info!(
            room = %self.code,
            participant = %id,
            players = state.members.len(),
            "participant left"
        );

        state.broadcast_roster(&self.code).await;
        true
    }

    /// Pushes the current roster to every member.
    pub async fn broadcast_roster(&self) {
        let mut state = self.state.lock().await;
        state.broadcast_roster(&self.code).await;
    }

    /// Sends a message to one member only. Returns `false` if `id` is not a member or the
    /// send failed.
    pub async fn send_to(&self, id: ParticipantId, message: ServerMessage) -> bool {
        let mut state = self.state.lock().await;
        let Some(index) = state.position(id) else {
            return false;
        };
        deliver(&mut state.members[index].sink, message)
            .await
            .is_ok()
    }

    /// Display names in join order.
    pub async fn roster(&self) -> Vec<String> {
        self.state.lock().await.roster()
    }

    pub async fn is_started(&self) -> bool {
        self.state.lock().await.started
    }

    pub async fn is_ready(&self, id: ParticipantId) -> bool {
        self.state.lock().await.ready.contains(&id)
    }

    pub async fn role_of(&self, id: ParticipantId) -> Option<Role> {
        self.state.lock().await.roles.get(&id).copied()
    }

    /// Current role map.
    pub async fn roles(&self) -> HashMap<ParticipantId, Role> {
        self.state.lock().await.roles.clone()
    }

    /// Connected member ids in join order.
    pub async fn member_ids(&self) -> Vec<ParticipantId> {
        self.state.lock().await.members.iter().map(|m| m.id).collect()
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        let state = self.state.lock().await;
        let ready = state
            .members
            .iter()
            .filter(|m| state.ready.contains(&m.id))
            .map(|m| m.name.clone())
            .collect();

        RoomSnapshot {
            code: self.code.clone(),
            name: self.name.clone(),
            capacity: self.capacity,
            started: state.started,
            players: state.roster(),
            ready,
        }
    }
}
