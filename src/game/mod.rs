//! Game Logic Module
//!
//! All arena simulation code. No networking, no wall clock: callers pass
//! `now` in, and randomness comes from the seeded RNG in `ArenaState`.
//!
//! ## Module Structure
//!
//! - `state`: Entity types and the arena state
//! - `store`: Entity store (players, monsters, projectiles)
//! - `command`: Join / move / skill / leave
//! - `skill`: Skill costs, cooldowns, and effects
//! - `combat`: Radius damage and shield-aware player damage
//! - `monster`: Monster seek/attack/death
//! - `projectile`: Projectile flight and hits
//! - `progression`: Experience and levels
//! - `tick`: Authoritative simulation step
//! - `events`: Targeted notifications for the network layer

pub mod state;
pub mod store;
pub mod command;
pub mod skill;
pub mod combat;
pub mod monster;
pub mod projectile;
pub mod progression;
pub mod tick;
pub mod events;

// Re-export key types
pub use state::{ArenaState, PlayerState, MonsterState, ProjectileState, PlayerId, Archetype, SkillSlot};
pub use store::EntityStore;
pub use command::{PlayerCommand, CommandOutcome, apply_command, remove_player};
pub use skill::SkillEffect;
pub use combat::Target;
pub use tick::{tick, ArenaConfig, TickResult};
pub use events::{GameEvent, GameEventData, Recipient};
