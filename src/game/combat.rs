//! Combat Resolution
//!
//! Radius damage and the single entry point for hurting a player.
//! All distance checks are planar (x/z) and inclusive.

use tracing::{debug, info};

use crate::core::vec3::Vec3;
use crate::game::events::{GameEventData, Recipient};
use crate::game::state::{ArenaState, PlayerId, MonsterId};
use crate::game::tick::ArenaConfig;

/// Something a radius attack hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// A player
    Player(PlayerId),
    /// A monster
    Monster(MonsterId),
}

/// Damage a player, honouring their shield.
///
/// While shielded the damage is scaled by `config.shield_damage_factor`.
/// Health floors at zero; reaching zero downs the player until
/// `now + respawn_delay_ms`. The player is sent a `playerUpdate`.
///
/// Returns the damage actually applied, or `None` if the player is unknown
/// or already downed.
pub fn damage_player(
    state: &mut ArenaState,
    config: &ArenaConfig,
    player_id: PlayerId,
    damage: u32,
    now: u64,
) -> Option<u32> {
    let player = state.store.player_mut(&player_id)?;
    if player.is_downed() {
        return None;
    }

    let damage = if player.is_shielded(now) {
        // Float-to-int casts saturate, so a negative or NaN factor yields 0
        (damage as f32 * config.shield_damage_factor) as u32
    } else {
        damage
    };

    let before = player.health;
    player.health = player.health.saturating_sub(damage);
    let applied = before - player.health;

    if player.health == 0 {
        player.respawn_at = Some(now + config.respawn_delay_ms);
        info!(player = %player_id.short(), "Player downed");
    }

    state.emit(
        Recipient::Player(player_id),
        GameEventData::PlayerUpdate { player_id },
    );

    Some(applied)
}

/// Damage everything within `radius` of `origin`.
///
/// The attacker is never hit. Downed players are skipped. Monsters are
/// damaged without a floor and remember the attacker as their last hitter.
/// Returns players first, then monsters, each in ascending id order.
pub fn apply_radius_damage(
    state: &mut ArenaState,
    config: &ArenaConfig,
    origin: Vec3,
    radius: f32,
    damage: u32,
    attacker: PlayerId,
    now: u64,
) -> Vec<Target> {
    let radius_sq = radius * radius;

    let player_targets: Vec<PlayerId> = state
        .store
        .players()
        .filter(|p| p.id != attacker && !p.is_downed())
        .filter(|p| p.position.planar_distance_squared(origin) <= radius_sq)
        .map(|p| p.id)
        .collect();

    let monster_targets: Vec<MonsterId> = state
        .store
        .monsters()
        .filter(|m| m.position.planar_distance_squared(origin) <= radius_sq)
        .map(|m| m.id)
        .collect();

    let mut hits = Vec::with_capacity(player_targets.len() + monster_targets.len());

    for player_id in player_targets {
        if damage_player(state, config, player_id, damage, now).is_some() {
            hits.push(Target::Player(player_id));
        }
    }

    for monster_id in monster_targets {
        let Some(monster) = state.store.monster_mut(monster_id) else {
            continue;
        };
        monster.health -= damage as i32;
        monster.last_hit_by = Some(attacker);
        hits.push(Target::Monster(monster_id));
    }

    debug!(
        attacker = %attacker.short(),
        radius,
        damage,
        hits = hits.len(),
        "Radius damage resolved"
    );

    hits
}
