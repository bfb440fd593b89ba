//! Identifier generation: room codes shown to players and opaque participant ids.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Length of a generated room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Uppercase alphabet without the look-alikes `0 O 1 I L`, so codes can be read aloud.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Opaque per-connection identifier. Never shown to players and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Returns a process-wide unique participant id.
pub fn new_participant_id() -> ParticipantId {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    ParticipantId(COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Returns a random room code of [`ROOM_CODE_LEN`] characters.
///
/// Uniqueness is not guaranteed here; the registry retries on collision.
pub fn new_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}
