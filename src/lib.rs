//! Room coordinator for the Blanco party game.
//!
//! Players join a capacity-bounded room over a persistent connection, signal readiness, and
//! once enough of them are connected the room hands each player a secret role: a few get
//! `BLANCO`, everyone else `NORMAL`.
//!
//! The pieces, leaves first: [`utils`] generates identifiers, [`role`] computes the role split,
//! [`room`] owns one session's state, [`registry`] maps codes to rooms, and [`session`] drives
//! one connection. [`transport`] adapts websockets and in-process channels to the
//! [`connection`] traits; [`server`] exposes everything over HTTP.
pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod registry;
pub mod response;
pub mod role;
pub mod room;
pub mod server;
pub mod session;
pub mod transport;
pub mod utils;

pub use registry::RoomRegistry;
pub use room::Room;
pub use session::{Coordinator, SessionEnd};
