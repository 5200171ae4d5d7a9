//! Player Commands
//!
//! The decoded form of everything a client can ask for, and how each
//! request mutates the arena. Commands apply immediately, between ticks.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::core::vec3::{Vec3, PlanarVec};
use crate::game::events::{GameEventData, Recipient};
use crate::game::skill::{use_skill, SkillEffect};
use crate::game::state::{ArenaState, Archetype, PlayerId, SkillSlot};
use crate::game::tick::ArenaConfig;

/// A validated request from one player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Enter the arena as the given archetype
    Join(Archetype),
    /// Client-reported position and facing
    Move {
        /// New position
        position: Vec3,
        /// New yaw
        rotation: f32,
    },
    /// Cast a skill
    Skill {
        /// Which binding
        slot: SkillSlot,
        /// Aim, for skills that need one
        direction: Option<PlanarVec>,
    },
}

/// What a command ended up doing.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    /// Player was created (or recreated)
    Joined,
    /// Position and rotation were overwritten
    Moved,
    /// A skill fired
    Skill(SkillEffect),
    /// Nothing changed
    Ignored,
}

/// Apply a command from `player_id`.
pub fn apply_command(
    state: &mut ArenaState,
    config: &ArenaConfig,
    player_id: PlayerId,
    command: PlayerCommand,
    now: u64,
) -> CommandOutcome {
    match command {
        PlayerCommand::Join(archetype) => {
            join(state, player_id, archetype);
            CommandOutcome::Joined
        }
        PlayerCommand::Move { position, rotation } => {
            if move_player(state, player_id, position, rotation) {
                CommandOutcome::Moved
            } else {
                CommandOutcome::Ignored
            }
        }
        PlayerCommand::Skill { slot, direction } => {
            match use_skill(state, config, player_id, slot, direction, now) {
                Some(effect) => CommandOutcome::Skill(effect),
                None => CommandOutcome::Ignored,
            }
        }
    }
}

/// Create the player at a random spawn point and introduce them.
///
/// Joining again replaces the previous character.
fn join(state: &mut ArenaState, player_id: PlayerId, archetype: Archetype) {
    state.add_player(player_id, archetype);

    state.emit(Recipient::Player(player_id), GameEventData::CurrentPlayers);
    state.emit(Recipient::Player(player_id), GameEventData::MonstersCreated);
    state.emit(Recipient::AllExcept(player_id), GameEventData::NewPlayer { player_id });

    info!(
        player = %player_id.short(),
        ?archetype,
        players = state.store.player_count(),
        "Player joined"
    );
}

/// Overwrite position and rotation. Ignored for unknown or downed players
/// and for non-finite input.
fn move_player(state: &mut ArenaState, player_id: PlayerId, position: Vec3, rotation: f32) -> bool {
    if !position.is_finite() || !rotation.is_finite() {
        debug!(player = %player_id.short(), "Dropped non-finite movement");
        return false;
    }

    let Some(player) = state.store.player_mut(&player_id) else {
        return false;
    };
    if player.is_downed() {
        return false;
    }

    player.position = position;
    player.rotation = rotation;

    state.emit(Recipient::AllExcept(player_id), GameEventData::PlayerMoved { player_id });
    true
}

/// Remove a departed player and tell everyone. Returns whether they existed.
pub fn remove_player(state: &mut ArenaState, player_id: PlayerId) -> bool {
    if state.store.remove_player(&player_id).is_none() {
        return false;
    }

    state.emit(Recipient::All, GameEventData::PlayerDisconnected { player_id });
    info!(
        player = %player_id.short(),
        players = state.store.player_count(),
        "Player left"
    );
    true
}
