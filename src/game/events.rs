//! Game Events
//!
//! Notifications produced by command handling and the tick. Events carry
//! ids only; the network layer resolves them to snapshots of the current
//! store when it dispatches, so a batch always reports post-step state.

use serde::{Serialize, Deserialize};

use crate::game::state::{PlayerId, MonsterId, ProjectileId, SkillSlot};

/// Who should receive an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Only this player's connection
    Player(PlayerId),
    /// Every connection
    All,
    /// Every connection except this player's
    AllExcept(PlayerId),
}

impl Recipient {
    /// Does this recipient include `id`?
    pub fn includes(&self, id: &PlayerId) -> bool {
        match self {
            Recipient::Player(target) => target == id,
            Recipient::All => true,
            Recipient::AllExcept(excluded) => excluded != id,
        }
    }
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Full player roster (sent to a joiner)
    CurrentPlayers,

    /// A player joined
    NewPlayer { player_id: PlayerId },

    /// A player left
    PlayerDisconnected { player_id: PlayerId },

    /// A player's position or rotation changed
    PlayerMoved { player_id: PlayerId },

    /// A player's stats changed
    PlayerUpdate { player_id: PlayerId },

    /// A player cast a skill
    SkillUsed { player_id: PlayerId, slot: SkillSlot },

    /// Full monster roster (on join and after a restock)
    MonstersCreated,

    /// Monster positions/health after a tick
    MonstersUpdate,

    /// A monster died and was removed
    MonsterDied { monster_id: MonsterId },

    /// A monster struck its target
    MonsterAttacked { monster_id: MonsterId },

    /// A projectile was fired
    ProjectileCreated { projectile_id: ProjectileId },

    /// Projectile positions after a tick
    ProjectilesUpdate,

    /// A projectile hit something or expired
    ProjectileDestroyed { projectile_id: ProjectileId },
}

/// A game event with timing and addressing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u64,

    /// Who receives it
    pub recipient: Recipient,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u64, recipient: Recipient, data: GameEventData) -> Self {
        Self { tick, recipient, data }
    }
}
