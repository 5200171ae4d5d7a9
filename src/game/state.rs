//! Game State Definitions
//!
//! Entity types for the arena and the top-level `ArenaState`.
//! Entities live in the `EntityStore`, which uses BTreeMap for
//! deterministic iteration order.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::core::vec3::{Vec3, PlanarVec};
use crate::core::rng::DeterministicRng;
use crate::core::hash::{StateHash, StateHasher, compute_state_hash};
use crate::game::events::{GameEvent, GameEventData, Recipient};
use crate::game::progression::xp_for_level;
use crate::game::store::EntityStore;

// =============================================================================
// IDS
// =============================================================================

/// Connection-scoped player identifier (UUID as bytes).
///
/// Implements Ord for deterministic BTreeMap ordering. On the wire it is the
/// hyphenated UUID string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Fresh random id for a new connection.
    pub fn random() -> Self {
        Self(*uuid::Uuid::new_v4().as_bytes())
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uuid_string())
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.to_uuid_string()
    }
}

impl TryFrom<String> for PlayerId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_uuid_str(&s).ok_or_else(|| format!("invalid player id: {s}"))
    }
}

/// Monster identifier (monotonic counter).
pub type MonsterId = u32;

/// Projectile identifier (monotonic counter).
pub type ProjectileId = u32;

// =============================================================================
// ARCHETYPE & SKILL SLOTS
// =============================================================================

/// A player's fixed combat role, chosen on join.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Archetype {
    /// Melee fighter: strike, dash
    Warrior = 0,
    /// Ranged caster: bolt, shield
    Mage = 1,
}

impl Archetype {
    /// Starting maximum health.
    pub fn base_health(self) -> u32 {
        match self {
            Archetype::Warrior => 100,
            Archetype::Mage => 100,
        }
    }

    /// Starting maximum energy.
    pub fn base_energy(self) -> u32 {
        match self {
            Archetype::Warrior => 100,
            Archetype::Mage => 100,
        }
    }
}

/// One of the four skill bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillSlot {
    /// Primary attack
    Q,
    /// Mobility / defence
    W,
    /// Self-heal
    E,
    /// Area attack
    R,
}

impl SkillSlot {
    /// All slots in binding order.
    pub const ALL: [SkillSlot; 4] = [SkillSlot::Q, SkillSlot::W, SkillSlot::E, SkillSlot::R];
}

/// Per-slot "next usable" timestamps (Unix ms).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTimers {
    /// Slot q
    pub q: u64,
    /// Slot w
    pub w: u64,
    /// Slot e
    pub e: u64,
    /// Slot r
    pub r: u64,
}

impl SkillTimers {
    /// Next usable time for a slot.
    pub fn get(&self, slot: SkillSlot) -> u64 {
        match slot {
            SkillSlot::Q => self.q,
            SkillSlot::W => self.w,
            SkillSlot::E => self.e,
            SkillSlot::R => self.r,
        }
    }

    /// Set next usable time for a slot.
    pub fn set(&mut self, slot: SkillSlot, ready_at: u64) {
        match slot {
            SkillSlot::Q => self.q = ready_at,
            SkillSlot::W => self.w = ready_at,
            SkillSlot::E => self.e = ready_at,
            SkillSlot::R => self.r = ready_at,
        }
    }
}

// =============================================================================
// PLAYER STATE
// =============================================================================

/// State of a single connected player.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerState {
    /// Unique player ID
    pub id: PlayerId,

    /// Current position (y is height)
    pub position: Vec3,

    /// Facing (yaw, radians)
    pub rotation: f32,

    /// Combat role
    pub archetype: Archetype,

    /// Current health, always within [0, max_health]
    pub health: u32,

    /// Maximum health
    pub max_health: u32,

    /// Current energy, always within [0, max_energy]
    pub energy: u32,

    /// Maximum energy
    pub max_energy: u32,

    /// Level (starts at 1)
    pub level: u32,

    /// Experience towards the next level
    pub xp: f32,

    /// Experience needed for the next level
    pub xp_to_next_level: f32,

    /// Next usable time per skill slot
    pub skill_ready_at: SkillTimers,

    /// Shield expiry (Unix ms); shielded while `now < shield_until`
    pub shield_until: u64,

    /// Set while downed (health hit 0): when the player comes back
    pub respawn_at: Option<u64>,
}

impl PlayerState {
    /// Half-size of the square players spawn in.
    pub const SPAWN_HALF_EXTENT: f32 = 3.0;

    /// Spawn height.
    pub const SPAWN_HEIGHT: f32 = 1.5;

    /// Create a new level-1 player at full health and energy.
    pub fn new(id: PlayerId, archetype: Archetype, position: Vec3) -> Self {
        let max_health = archetype.base_health();
        let max_energy = archetype.base_energy();
        Self {
            id,
            position,
            rotation: 0.0,
            archetype,
            health: max_health,
            max_health,
            energy: max_energy,
            max_energy,
            level: 1,
            xp: 0.0,
            xp_to_next_level: xp_for_level(1),
            skill_ready_at: SkillTimers::default(),
            shield_until: 0,
            respawn_at: None,
        }
    }

    /// Shield active at `now`?
    #[inline]
    pub fn is_shielded(&self, now: u64) -> bool {
        now < self.shield_until
    }

    /// Waiting to respawn?
    #[inline]
    pub fn is_downed(&self) -> bool {
        self.respawn_at.is_some()
    }

    /// Restore health, capped at max. Returns the amount actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health - before
    }

    /// Restore energy, capped at max. Returns the amount actually restored.
    pub fn restore_energy(&mut self, amount: u32) -> u32 {
        let before = self.energy;
        self.energy = self.energy.saturating_add(amount).min(self.max_energy);
        self.energy - before
    }

    /// Fill health and energy to their maxima.
    pub fn restore_full(&mut self) {
        self.health = self.max_health;
        self.energy = self.max_energy;
    }

    /// Hash this player's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_uuid(&self.id.0);
        hasher.update_vec3(self.position);
        hasher.update_f32(self.rotation);
        hasher.update_u8(self.archetype as u8);
        hasher.update_u32(self.health);
        hasher.update_u32(self.max_health);
        hasher.update_u32(self.energy);
        hasher.update_u32(self.max_energy);
        hasher.update_u32(self.level);
        hasher.update_f32(self.xp);
        for slot in SkillSlot::ALL {
            hasher.update_u64(self.skill_ready_at.get(slot));
        }
        hasher.update_u64(self.shield_until);
        hasher.update_u64(self.respawn_at.unwrap_or(0));
    }
}

// =============================================================================
// MONSTER STATE
// =============================================================================

/// State of a monster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonsterState {
    /// Unique monster ID (monotonic counter)
    pub id: MonsterId,

    /// Position in arena
    pub position: Vec3,

    /// Current health; may dip below zero until the next tick removes it
    pub health: i32,

    /// Maximum health
    pub max_health: i32,

    /// Distance moved per tick while seeking
    pub speed: f32,

    /// Earliest time (Unix ms) of the next attack
    pub attack_ready_at: u64,

    /// Most recent player to damage this monster
    pub last_hit_by: Option<PlayerId>,
}

impl MonsterState {
    /// Starting health
    pub const MAX_HEALTH: i32 = 50;

    /// Movement per tick
    pub const SPEED: f32 = 0.02;

    /// Half-size of the square monsters spawn in
    pub const SPAWN_HALF_EXTENT: f32 = 20.0;

    /// Spawn height
    pub const SPAWN_HEIGHT: f32 = 0.5;

    /// Create a new monster at full health.
    pub fn new(id: MonsterId, position: Vec3) -> Self {
        Self {
            id,
            position,
            health: Self::MAX_HEALTH,
            max_health: Self::MAX_HEALTH,
            speed: Self::SPEED,
            attack_ready_at: 0,
            last_hit_by: None,
        }
    }

    /// Health at or below zero.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

// =============================================================================
// PROJECTILE STATE
// =============================================================================

/// State of a projectile in flight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Unique projectile ID (monotonic counter)
    pub id: ProjectileId,

    /// Current position
    pub position: Vec3,

    /// Player who fired it
    pub owner: PlayerId,

    /// Normalized travel direction
    pub direction: PlanarVec,

    /// Distance per tick
    pub speed: f32,

    /// Ticks left before it expires
    pub lifespan: u32,
}

impl ProjectileState {
    /// Create a new projectile.
    pub fn new(
        id: ProjectileId,
        position: Vec3,
        owner: PlayerId,
        direction: PlanarVec,
        speed: f32,
        lifespan: u32,
    ) -> Self {
        Self {
            id,
            position,
            owner,
            direction,
            speed,
            lifespan,
        }
    }

    /// Move one tick along the direction and burn one tick of lifespan.
    #[inline]
    pub fn advance(&mut self) {
        self.position = self.position.offset_planar(self.direction.scale(self.speed));
        self.lifespan = self.lifespan.saturating_sub(1);
    }

    /// Out of lifespan?
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.lifespan == 0
    }
}

// =============================================================================
// ARENA STATE
// =============================================================================

/// Complete simulation state of the arena.
#[derive(Clone, Debug)]
pub struct ArenaState {
    /// Ticks simulated so far
    pub tick: u64,

    /// RNG seed (for verification)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// All entities
    pub store: EntityStore,

    /// Events generated since the last `take_events`
    pending_events: Vec<GameEvent>,
}

impl ArenaState {
    /// Create an empty arena.
    pub fn new(rng_seed: u64) -> Self {
        Self {
            tick: 0,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
            store: EntityStore::new(),
            pending_events: Vec::new(),
        }
    }

    /// Random spawn point for a player.
    pub fn random_player_spawn(&mut self) -> Vec3 {
        self.rng.point_in_square(PlayerState::SPAWN_HALF_EXTENT, PlayerState::SPAWN_HEIGHT)
    }

    /// Add (or replace) a player at a random spawn point.
    pub fn add_player(&mut self, id: PlayerId, archetype: Archetype) {
        let spawn = self.random_player_spawn();
        self.store.insert_player(PlayerState::new(id, archetype, spawn));
    }

    /// Spawn a batch of monsters at random positions. Returns their ids.
    pub fn spawn_monsters(&mut self, count: u32) -> Vec<MonsterId> {
        (0..count)
            .map(|_| {
                let position = self.rng.point_in_square(
                    MonsterState::SPAWN_HALF_EXTENT,
                    MonsterState::SPAWN_HEIGHT,
                );
                self.store.spawn_monster(position)
            })
            .collect()
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            // BTreeMap order keeps this stable
            for player in self.store.players() {
                player.hash_into(hasher);
            }

            for monster in self.store.monsters() {
                hasher.update_u32(monster.id);
                hasher.update_vec3(monster.position);
                hasher.update_i32(monster.health);
                hasher.update_u64(monster.attack_ready_at);
                match monster.last_hit_by {
                    Some(id) => hasher.update_uuid(&id.0),
                    None => hasher.update_bool(false),
                }
            }

            for projectile in self.store.projectiles() {
                hasher.update_u32(projectile.id);
                hasher.update_vec3(projectile.position);
                hasher.update_uuid(&projectile.owner.0);
                hasher.update_planar(projectile.direction);
                hasher.update_u32(projectile.lifespan);
            }

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);
        })
    }

    /// Queue an event stamped with the current tick.
    pub fn emit(&mut self, recipient: Recipient, data: GameEventData) {
        self.pending_events.push(GameEvent::new(self.tick, recipient, data));
    }

    /// Events queued so far (not consumed).
    pub fn pending_events(&self) -> &[GameEvent] {
        &self.pending_events
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_ordering() {
        let id1 = PlayerId::new([0; 16]);
        let id2 = PlayerId::new([1; 16]);
        let id3 = PlayerId::new([0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);

        assert!(id1 < id2);
        assert!(id1 < id3);
        assert!(id3 < id2);
    }

    #[test]
    fn test_player_id_string_roundtrip() {
        let id = PlayerId::random();
        let s = id.to_uuid_string();
        assert_eq!(PlayerId::from_uuid_str(&s), Some(id));
        assert!(PlayerId::from_uuid_str("not-a-uuid").is_none());

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{s}\""));
        assert_eq!(id.short().len(), 8);
    }

    #[test]
    fn test_new_player_defaults() {
        let id = PlayerId::new([1; 16]);
        let player = PlayerState::new(id, Archetype::Warrior, Vec3::ZERO);

        assert_eq!(player.health, 100);
        assert_eq!(player.max_health, 100);
        assert_eq!(player.energy, 100);
        assert_eq!(player.max_energy, 100);
        assert_eq!(player.level, 1);
        assert_eq!(player.xp, 0.0);
        assert_eq!(player.xp_to_next_level, 100.0);
        assert!(!player.is_shielded(0));
        assert!(!player.is_downed());
    }

    #[test]
    fn test_heal_and_energy_capped() {
        let mut player = PlayerState::new(PlayerId::new([1; 16]), Archetype::Mage, Vec3::ZERO);

        player.health = 90;
        assert_eq!(player.heal(30), 10);
        assert_eq!(player.health, 100);

        player.energy = 5;
        assert_eq!(player.restore_energy(10), 10);
        assert_eq!(player.energy, 15);
    }

    #[test]
    fn test_shield_expiry_is_exclusive() {
        let mut player = PlayerState::new(PlayerId::new([1; 16]), Archetype::Mage, Vec3::ZERO);
        player.shield_until = 3_000;

        assert!(player.is_shielded(2_999));
        assert!(!player.is_shielded(3_000));
    }

    #[test]
    fn test_skill_timers() {
        let mut timers = SkillTimers::default();
        timers.set(SkillSlot::E, 5_000);
        assert_eq!(timers.get(SkillSlot::E), 5_000);
        assert_eq!(timers.get(SkillSlot::Q), 0);
    }

    #[test]
    fn test_projectile_advance() {
        let mut p = ProjectileState::new(
            0,
            Vec3::new(0.0, 1.5, 0.0),
            PlayerId::new([1; 16]),
            PlanarVec::new(1.0, 0.0),
            0.3,
            2,
        );

        p.advance();
        assert!((p.position.x - 0.3).abs() < 1e-6);
        assert_eq!(p.position.y, 1.5);
        assert_eq!(p.lifespan, 1);
        assert!(!p.is_expired());

        p.advance();
        assert!(p.is_expired());
    }

    #[test]
    fn test_arena_state_determinism() {
        let mut state1 = ArenaState::new(12345);
        let mut state2 = ArenaState::new(12345);

        for i in 0..4 {
            let id = PlayerId::new([i; 16]);
            state1.add_player(id, Archetype::Warrior);
            state2.add_player(id, Archetype::Warrior);
        }
        state1.spawn_monsters(5);
        state2.spawn_monsters(5);

        for (p1, p2) in state1.store.players().zip(state2.store.players()) {
            assert_eq!(p1.position, p2.position, "Spawn positions should be deterministic");
        }
        assert_eq!(state1.compute_hash(), state2.compute_hash());
    }

    #[test]
    fn test_spawn_positions_in_bounds() {
        let mut state = ArenaState::new(7);
        state.add_player(PlayerId::new([1; 16]), Archetype::Mage);
        let ids = state.spawn_monsters(20);
        assert_eq!(ids.len(), 20);

        let player = state.store.player(&PlayerId::new([1; 16])).unwrap();
        assert!(player.position.x.abs() <= PlayerState::SPAWN_HALF_EXTENT);
        assert_eq!(player.position.y, PlayerState::SPAWN_HEIGHT);

        for monster in state.store.monsters() {
            assert!(monster.position.x.abs() <= MonsterState::SPAWN_HALF_EXTENT);
            assert!(monster.position.z.abs() <= MonsterState::SPAWN_HALF_EXTENT);
        }
    }

    #[test]
    fn test_emit_and_take_events() {
        let mut state = ArenaState::new(1);
        state.tick = 9;
        state.emit(Recipient::All, GameEventData::MonsterDied { monster_id: 3 });

        assert_eq!(state.pending_events().len(), 1);
        let events = state.take_events();
        assert_eq!(events[0].tick, 9);
        assert!(state.pending_events().is_empty());
    }
}
