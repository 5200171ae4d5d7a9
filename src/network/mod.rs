//! Network Layer
//!
//! WebSocket server for real-time multiplayer communication.
//! This layer owns the wall clock - all game rules run through `game/`.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{
    ClientMessage, ServerMessage, PlayerSnapshot, MonsterSnapshot, ProjectileSnapshot,
};
pub use session::{ArenaSession, SessionError};
pub use server::{GameServer, ServerConfig, GameServerError};
