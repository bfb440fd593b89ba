
use crate::role::Role;
use serde::ser::SerializeStruct;
use serde::Serialize;
use std::fmt::Debug;

const MESSAGE_STR: &str = "message";
const TYPE_STR: &str = "type";
const PLAYERS_STR: &str = "players";
const ROLE_STR: &str = "role";
const ROOM_STR: &str = "room";
const CODE_STR: &str = "code";
const PLAYER_STR: &str = "player";
const ERROR_STR: &str = "error";

/// Plain-text notice sent before closing a connection addressed to an unknown room.
pub const ROOM_NOT_FOUND_NOTICE: &str = "room not found";

/// Outbound server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Roster broadcast to every member after each membership or readiness change.
    UpdatePlayers(Vec<String>),
    /// Private role, sent once per participant when the game starts.
    Role(Role),
    /// Private greeting sent right after a successful join.
    Joined {
        room: String,
        code: String,
        player: String,
    },
    /// Private rejection notice: invalid message, full room, game already started.
    Error(String),
    /// Terminal notice for an unknown room code; goes out as plain text.
    RoomNotFound,
}

impl ServerMessage {
    /// Renders the message as a text frame.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        match self {
            ServerMessage::RoomNotFound => Ok(ROOM_NOT_FOUND_NOTICE.to_string()),
            _ => serde_json::to_string(self),
        }
    }
}

impl serde::ser::Serialize for ServerMessage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self {
            ServerMessage::UpdatePlayers(players) => {
                let mut s = serializer.serialize_struct(MESSAGE_STR, 2)?;
                s.serialize_field(TYPE_STR, "update_players")?;
                s.serialize_field(PLAYERS_STR, players)?;
                s.end()
            }
            ServerMessage::Role(role) => {
                let mut s = serializer.serialize_struct(MESSAGE_STR, 2)?;
                s.serialize_field(TYPE_STR, "role")?;
                s.serialize_field(ROLE_STR, role)?;
                s.end()
            }
            ServerMessage::Joined { room, code, player } => {
                let mut s = serializer.serialize_struct(MESSAGE_STR, 4)?;
                s.serialize_field(TYPE_STR, "joined")?;
                s.serialize_field(ROOM_STR, room)?;
                s.serialize_field(CODE_STR, code)?;
                s.serialize_field(PLAYER_STR, player)?;
                s.end()
            }
            ServerMessage::Error(message) => {
                let mut s = serializer.serialize_struct(MESSAGE_STR, 2)?;
                s.serialize_field(TYPE_STR, ERROR_STR)?;
                s.serialize_field(MESSAGE_STR, message)?;
                s.end()
            }
            ServerMessage::RoomNotFound => {
                let mut s = serializer.serialize_struct(MESSAGE_STR, 2)?;
                s.serialize_field(TYPE_STR, ERROR_STR)?;
                s.serialize_field(MESSAGE_STR, ROOM_NOT_FOUND_NOTICE)?;
                s.end()
            }
        }
    }
}
