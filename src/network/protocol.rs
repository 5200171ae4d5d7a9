//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON text message `{"event": <name>, "data": <payload>}`
//! with camelCase payload fields.

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::core::vec3::{Vec3, PlanarVec};
use crate::game::command::PlayerCommand;
use crate::game::state::{
    Archetype, MonsterId, MonsterState, PlayerId, PlayerState,
    ProjectileId, ProjectileState, SkillSlot, SkillTimers,
};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Enter the arena with a chosen archetype.
    JoinGame(Archetype),

    /// Client-authoritative position update.
    PlayerMovement(MovementData),

    /// Skill activation request.
    Skill(SkillRequest),

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back
        timestamp: u64,
    },
}

/// Facing, as clients send it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Yaw in radians.
    pub y: f32,
}

/// Position report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementData {
    /// X position.
    pub x: f32,
    /// Y position (height).
    pub y: f32,
    /// Z position.
    pub z: f32,
    /// Facing.
    pub rotation: Rotation,
}

/// Skill activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkillRequest {
    /// Which slot.
    pub id: SkillSlot,
    /// Aim direction (required for the mage bolt).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<PlanarVec>,
}

impl ClientMessage {
    /// Convert to a game command. Ping has no game meaning.
    pub fn to_command(&self) -> Option<PlayerCommand> {
        match *self {
            ClientMessage::JoinGame(archetype) => Some(PlayerCommand::Join(archetype)),
            ClientMessage::PlayerMovement(m) => Some(PlayerCommand::Move {
                position: Vec3::new(m.x, m.y, m.z),
                rotation: m.rotation.y,
            }),
            ClientMessage::Skill(req) => Some(PlayerCommand::Skill {
                slot: req.id,
                direction: req.direction,
            }),
            ClientMessage::Ping { .. } => None,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Everyone in the arena, keyed by id (sent to a joiner).
    CurrentPlayers(BTreeMap<PlayerId, PlayerSnapshot>),

    /// Someone joined.
    NewPlayer(PlayerSnapshot),

    /// Someone left.
    PlayerDisconnected(PlayerId),

    /// Someone moved.
    PlayerMoved(PlayerSnapshot),

    /// A player's stats changed.
    PlayerUpdate(PlayerSnapshot),

    /// A skill was cast.
    SkillUsed(SkillUsedInfo),

    /// All monsters, keyed by id (on join and after a restock).
    MonstersCreated(BTreeMap<MonsterId, MonsterSnapshot>),

    /// All monsters after a tick.
    MonstersUpdate(BTreeMap<MonsterId, MonsterSnapshot>),

    /// A monster died.
    MonsterDied(MonsterId),

    /// A monster attacked.
    MonsterAttacked(MonsterId),

    /// A projectile was fired.
    ProjectileCreated(ProjectileSnapshot),

    /// All projectiles after a tick.
    ProjectilesUpdate(BTreeMap<ProjectileId, ProjectileSnapshot>),

    /// A projectile hit something or expired.
    ProjectileDestroyed(ProjectileId),

    /// Pong response.
    Pong(PongInfo),

    /// Server is shutting down.
    Shutdown {
        /// Why
        reason: String,
    },
}

/// Skill cast announcement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillUsedInfo {
    /// Caster.
    pub player_id: PlayerId,
    /// Slot.
    pub skill_id: SkillSlot,
}

/// Pong payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PongInfo {
    /// Client timestamp from the ping.
    pub timestamp: u64,
    /// Server wall clock (Unix ms).
    pub server_time: u64,
}

/// Player as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Player identifier.
    pub id: PlayerId,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Z position.
    pub z: f32,
    /// Archetype.
    pub character: Archetype,
    /// Facing.
    pub rotation: Rotation,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// Current energy.
    pub energy: u32,
    /// Maximum energy.
    pub max_energy: u32,
    /// Level.
    pub level: u32,
    /// Experience into the current level.
    pub xp: f32,
    /// Experience needed for the next level.
    pub xp_to_next_level: f32,
    /// Next usable time per slot (Unix ms).
    pub last_skill_time: SkillTimers,
    /// Shield active right now.
    pub is_shielded: bool,
    /// Shield expiry (Unix ms).
    pub shielded_until: u64,
    /// Waiting to respawn.
    pub is_downed: bool,
}

impl PlayerSnapshot {
    /// Capture a player's state at `now`.
    pub fn capture(player: &PlayerState, now: u64) -> Self {
        Self {
            id: player.id,
            x: player.position.x,
            y: player.position.y,
            z: player.position.z,
            character: player.archetype,
            rotation: Rotation { y: player.rotation },
            health: player.health,
            max_health: player.max_health,
            energy: player.energy,
            max_energy: player.max_energy,
            level: player.level,
            xp: player.xp,
            xp_to_next_level: player.xp_to_next_level,
            last_skill_time: player.skill_ready_at,
            is_shielded: player.is_shielded(now),
            shielded_until: player.shield_until,
            is_downed: player.is_downed(),
        }
    }
}

/// Monster as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonsterSnapshot {
    /// Monster identifier.
    pub id: MonsterId,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Z position.
    pub z: f32,
    /// Current health (may be negative just before removal).
    pub health: i32,
    /// Maximum health.
    pub max_health: i32,
    /// Movement per tick.
    pub speed: f32,
    /// Next attack time (Unix ms).
    pub attack_cooldown: u64,
    /// Last player to damage it.
    pub last_hit_by: Option<PlayerId>,
}

impl MonsterSnapshot {
    /// Capture a monster's state.
    pub fn capture(monster: &MonsterState) -> Self {
        Self {
            id: monster.id,
            x: monster.position.x,
            y: monster.position.y,
            z: monster.position.z,
            health: monster.health,
            max_health: monster.max_health,
            speed: monster.speed,
            attack_cooldown: monster.attack_ready_at,
            last_hit_by: monster.last_hit_by,
        }
    }
}

/// Projectile as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileSnapshot {
    /// Projectile identifier.
    pub id: ProjectileId,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Z position.
    pub z: f32,
    /// Who fired it.
    pub owner: PlayerId,
    /// Travel direction.
    pub direction: PlanarVec,
    /// Distance per tick.
    pub speed: f32,
    /// Ticks remaining.
    pub lifespan: u32,
}

impl ProjectileSnapshot {
    /// Capture a projectile's state.
    pub fn capture(projectile: &ProjectileState) -> Self {
        Self {
            id: projectile.id,
            x: projectile.position.x,
            y: projectile.position.y,
            z: projectile.position.z,
            owner: projectile.owner,
            direction: projectile.direction,
            speed: projectile.speed,
            lifespan: projectile.lifespan,
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Event name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ServerMessage::CurrentPlayers(_) => "currentPlayers",
            ServerMessage::NewPlayer(_) => "newPlayer",
            ServerMessage::PlayerDisconnected(_) => "playerDisconnected",
            ServerMessage::PlayerMoved(_) => "playerMoved",
            ServerMessage::PlayerUpdate(_) => "playerUpdate",
            ServerMessage::SkillUsed(_) => "skillUsed",
            ServerMessage::MonstersCreated(_) => "monstersCreated",
            ServerMessage::MonstersUpdate(_) => "monstersUpdate",
            ServerMessage::MonsterDied(_) => "monsterDied",
            ServerMessage::MonsterAttacked(_) => "monsterAttacked",
            ServerMessage::ProjectileCreated(_) => "projectileCreated",
            ServerMessage::ProjectilesUpdate(_) => "projectilesUpdate",
            ServerMessage::ProjectileDestroyed(_) => "projectileDestroyed",
            ServerMessage::Pong(_) => "pong",
            ServerMessage::Shutdown { .. } => "shutdown",
        }
    }
}
