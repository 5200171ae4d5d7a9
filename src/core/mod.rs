//! Core primitives.
//!
//! Geometry, seeded randomness, and state hashing. Nothing in here knows
//! about players, monsters, or the network.

pub mod vec3;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec3::{Vec3, PlanarVec};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash};
