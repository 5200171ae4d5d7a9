//! # Arena Game Server
//!
//! Authoritative server for a small real-time multiplayer arena: players
//! pick an archetype, move freely, cast skills, fight roaming monsters,
//! and level up from kills.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ARENA SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  ├── vec3.rs     - 3D positions and planar directions        │
//! │  ├── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │  └── hash.rs     - State digest                              │
//! │                                                              │
//! │  game/           - Game logic (no I/O, no wall clock)        │
//! │  ├── state.rs    - Entities and arena state                  │
//! │  ├── store.rs    - Entity store                              │
//! │  ├── command.rs  - Join, move, skill, leave                  │
//! │  ├── skill.rs    - Skill resolver                            │
//! │  ├── combat.rs   - Damage, shields, downed players           │
//! │  ├── monster.rs  - Monster seek / attack / death             │
//! │  ├── projectile.rs - Projectile flight and hits              │
//! │  ├── progression.rs - Experience and levels                  │
//! │  ├── tick.rs     - Authoritative simulation step             │
//! │  └── events.rs   - Targeted notifications                    │
//! │                                                              │
//! │  network/        - Networking (wall clock lives here)        │
//! │  ├── server.rs   - WebSocket server and tick loop            │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Connections and event dispatch            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! `game/` takes the current time as an argument, iterates entities in
//! ascending id order, and draws all randomness from the seeded PRNG in
//! [`ArenaState`]. The same seed, commands, and timestamps replay to the
//! same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use core::vec3::{Vec3, PlanarVec};
pub use game::state::{ArenaState, PlayerState, MonsterState, ProjectileState, PlayerId};
pub use game::tick::{tick, ArenaConfig};
pub use network::server::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
