//! Secret role assignment.
//!
//! The number of special roles depends only on the room capacity, so a game that starts at
//! quorum with fewer players than capacity still has a predictable number of specials.

use crate::utils::ParticipantId;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Role privately delivered to each participant once the game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The minority role.
    #[serde(rename = "BLANCO")]
    Special,
    #[serde(rename = "NORMAL")]
    Normal,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Special => "BLANCO",
            Role::Normal => "NORMAL",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number of special roles for a room of `capacity`: one up to five players, then one more
/// for every further four.
pub fn special_count(capacity: usize) -> usize {
    if capacity <= 5 {
        1
    } else {
        1 + (capacity - 5) / 4
    }
}

/// Assigns a role to every id in `participants`.
///
/// `min(special_count(capacity), participants.len())` ids are picked uniformly at random
/// without replacement to be [`Role::Special`]; everyone else is [`Role::Normal`].
pub fn assign_roles<R: Rng + ?Sized>(
    participants: &[ParticipantId],
    capacity: usize,
    rng: &mut R,
) -> HashMap<ParticipantId, Role> {
    let mut roles: HashMap<ParticipantId, Role> = participants
        .iter()
        .map(|id| (*id, Role::Normal))
        .collect();

    let specials = special_count(capacity).min(participants.len());
    for i in index::sample(rng, participants.len(), specials).iter() {
        roles.insert(participants[i], Role::Special);
    }

    roles
}
