//! Projectile Movement and Collision
//!
//! Bolts fly in a straight line at a fixed per-tick speed and stop at the
//! first thing they touch.

use tracing::debug;

use crate::core::vec3::Vec3;
use crate::game::combat::{damage_player, Target};
use crate::game::events::{GameEventData, Recipient};
use crate::game::state::{ArenaState, PlayerId, ProjectileId};
use crate::game::tick::ArenaConfig;

/// Hit radius around a projectile (inclusive).
pub const PROJECTILE_HIT_RADIUS: f32 = 1.0;

/// Damage dealt on hit.
pub const PROJECTILE_DAMAGE: u32 = 15;

/// Advance every projectile one tick.
///
/// Players other than the owner are checked before monsters, each in
/// ascending id order; the first in range takes the hit. A projectile that
/// hits or runs out of lifespan is removed and announced once.
///
/// Returns the ids destroyed this tick.
pub fn process_projectiles(
    state: &mut ArenaState,
    config: &ArenaConfig,
    now: u64,
) -> Vec<ProjectileId> {
    let mut destroyed = Vec::new();

    for projectile_id in state.store.projectile_ids() {
        let Some(projectile) = state.store.projectile_mut(projectile_id) else {
            continue;
        };
        projectile.advance();
        let position = projectile.position;
        let owner = projectile.owner;
        let expired = projectile.is_expired();

        let hit = find_target(state, position, owner);

        match hit {
            Some(Target::Player(player_id)) => {
                damage_player(state, config, player_id, PROJECTILE_DAMAGE, now);
            }
            Some(Target::Monster(monster_id)) => {
                if let Some(monster) = state.store.monster_mut(monster_id) {
                    monster.health -= PROJECTILE_DAMAGE as i32;
                    monster.last_hit_by = Some(owner);
                }
            }
            None => {}
        }

        if hit.is_some() || expired {
            state.store.remove_projectile(projectile_id);
            state.emit(Recipient::All, GameEventData::ProjectileDestroyed { projectile_id });
            debug!(projectile_id, ?hit, "Projectile destroyed");
            destroyed.push(projectile_id);
        }
    }

    if state.store.projectile_count() > 0 {
        state.emit(Recipient::All, GameEventData::ProjectilesUpdate);
    }

    destroyed
}

/// First living non-owner player, else first living monster, in range.
fn find_target(state: &ArenaState, position: Vec3, owner: PlayerId) -> Option<Target> {
    let radius_sq = PROJECTILE_HIT_RADIUS * PROJECTILE_HIT_RADIUS;

    let player = state
        .store
        .players()
        .filter(|p| p.id != owner && !p.is_downed())
        .find(|p| p.position.planar_distance_squared(position) <= radius_sq)
        .map(|p| Target::Player(p.id));

    player.or_else(|| {
        state
            .store
            .monsters()
            .filter(|m| !m.is_dead())
            .find(|m| m.position.planar_distance_squared(position) <= radius_sq)
            .map(|m| Target::Monster(m.id))
    })
}
