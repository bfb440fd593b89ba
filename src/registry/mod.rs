//! Process-wide room registry.
//!
//! Owned explicitly and shared through an `Arc`; nothing here is a global.

use crate::error::RegistryError;
use crate::room::Room;
use crate::utils::new_room_code;
use dashmap::{DashMap, DashSet};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Smallest capacity a room may be created with.
pub const MIN_CAPACITY: usize = 2;

/// Default upper bound on room capacity.
pub const DEFAULT_MAX_CAPACITY: usize = 100;

pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
    /// Every code ever handed out, including reaped rooms, so codes are never reissued.
    issued: DashSet<String>,
    rng: Mutex<StdRng>,
    max_capacity: usize,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()), DEFAULT_MAX_CAPACITY)
    }

    /// Registry whose room codes and role draws are reproducible from `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), DEFAULT_MAX_CAPACITY)
    }

    pub fn with_rng(rng: StdRng, max_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            issued: DashSet::new(),
            rng: Mutex::new(rng),
            max_capacity: max_capacity.max(MIN_CAPACITY),
        }
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity.max(MIN_CAPACITY);
        self
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Creates a room under a fresh code.
    pub fn create(&self, name: &str, capacity: usize) -> Result<Arc<Room>, RegistryError> {
        if !(MIN_CAPACITY..=self.max_capacity).contains(&capacity) {
            return Err(RegistryError::InvalidCapacity {
                requested: capacity,
                min: MIN_CAPACITY,
                max: self.max_capacity,
            });
        }

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let code = loop {
            let code = new_room_code(&mut *rng);
            if self.issued.insert(code.clone()) {
                break code;
            }
            tracing::debug!(code = %code, "room code collision, retrying");
        };
        let room_rng = StdRng::from_rng(&mut *rng);
        drop(rng);

        let room = Arc::new(Room::new(code.clone(), name.to_string(), capacity, room_rng));
        self.rooms.insert(code.clone(), room.clone());
        tracing::info!(room = %code, name = %name, capacity, "room created");
        Ok(room)
    }

    /// Looks a room up by code. Absence is not an error.
    pub fn get(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms.get(code).map(|room| room.clone())
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Drops rooms that have no members and saw no membership change for `ttl`.
    /// Returns how many rooms were removed. Their codes stay retired.
    pub fn reap_idle(&self, ttl: Duration) -> usize {
        let before = self.rooms.len();
        self.rooms.retain(|_, room| !room.try_retire(ttl));
        let removed = before.saturating_sub(self.rooms.len());
        if removed > 0 {
            tracing::info!(removed, remaining = self.rooms.len(), "reaped idle rooms");
        }
        removed
    }
}
