//! Skill Resolution
//!
//! Each archetype binds four skills to q/w/e/r. Costs and cooldowns are
//! shared by slot; the effect depends on archetype and slot.

use tracing::debug;

use crate::core::vec3::PlanarVec;
use crate::game::combat::{apply_radius_damage, Target};
use crate::game::events::{GameEventData, Recipient};
use crate::game::state::{ArenaState, Archetype, PlayerId, ProjectileId, SkillSlot};
use crate::game::tick::ArenaConfig;

/// Energy cost per slot (q, w, e, r).
pub const SKILL_COSTS: [u32; 4] = [10, 15, 20, 50];

/// Cooldown per slot in milliseconds (q, w, e, r).
pub const SKILL_COOLDOWNS_MS: [u64; 4] = [
    2_000,  // q
    3_000,  // w
    5_000,  // e
    10_000, // r
];

/// Warrior strike reach.
pub const MELEE_RADIUS: f32 = 1.7;

/// Warrior strike damage.
pub const MELEE_DAMAGE: u32 = 20;

/// Warrior dash distance.
pub const DASH_DISTANCE: f32 = 5.0;

/// Mage bolt speed per tick.
pub const PROJECTILE_SPEED: f32 = 0.3;

/// Mage bolt lifespan in ticks.
pub const PROJECTILE_LIFESPAN: u32 = 100;

/// Mage shield duration.
pub const SHIELD_DURATION_MS: u64 = 3_000;

/// Heal amount (both archetypes).
pub const HEAL_AMOUNT: u32 = 30;

/// Area attack radius (both archetypes).
pub const AREA_RADIUS: f32 = 3.0;

/// Area attack damage (both archetypes).
pub const AREA_DAMAGE: u32 = 50;

/// What a successful cast did.
#[derive(Clone, Debug, PartialEq)]
pub enum SkillEffect {
    /// Mage bolt fired
    Projectile(ProjectileId),
    /// Warrior strike landed on these targets
    Melee(Vec<Target>),
    /// Warrior dashed
    Dash,
    /// Mage shield raised until this time
    Shield { until: u64 },
    /// Health restored (may be 0 at full health)
    Heal { restored: u32 },
    /// Area attack landed on these targets
    Area(Vec<Target>),
}

/// Energy cost of a slot.
#[inline]
pub fn skill_cost(slot: SkillSlot) -> u32 {
    SKILL_COSTS[slot_index(slot)]
}

/// Cooldown of a slot in milliseconds.
#[inline]
pub fn skill_cooldown_ms(slot: SkillSlot) -> u64 {
    SKILL_COOLDOWNS_MS[slot_index(slot)]
}

#[inline]
fn slot_index(slot: SkillSlot) -> usize {
    match slot {
        SkillSlot::Q => 0,
        SkillSlot::W => 1,
        SkillSlot::E => 2,
        SkillSlot::R => 3,
    }
}

/// Use a skill.
///
/// Returns `None` without touching state when the player is unknown or
/// downed, lacks energy, the slot is cooling down, or a mage bolt has no
/// usable direction. Otherwise debits energy, starts the cooldown at `now`,
/// sends the caster an update, announces the cast, and applies the effect.
/// Snapshots are taken at dispatch, so the caster's update still shows the
/// effect (heal, shield, dash).
pub fn use_skill(
    state: &mut ArenaState,
    config: &ArenaConfig,
    player_id: PlayerId,
    slot: SkillSlot,
    direction: Option<PlanarVec>,
    now: u64,
) -> Option<SkillEffect> {
    let cost = skill_cost(slot);

    let (archetype, position, rotation) = {
        let player = state.store.player(&player_id)?;
        if player.is_downed() {
            debug!(player = %player_id.short(), ?slot, "Skill rejected: downed");
            return None;
        }
        if player.energy < cost {
            debug!(player = %player_id.short(), ?slot, energy = player.energy, "Skill rejected: energy");
            return None;
        }
        if now < player.skill_ready_at.get(slot) {
            debug!(player = %player_id.short(), ?slot, "Skill rejected: cooldown");
            return None;
        }
        (player.archetype, player.position, player.rotation)
    };

    // Bolt direction is validated before anything is spent
    let bolt_direction = match (archetype, slot) {
        (Archetype::Mage, SkillSlot::Q) => {
            let Some(dir) = direction.and_then(PlanarVec::normalize) else {
                debug!(player = %player_id.short(), "Skill rejected: no bolt direction");
                return None;
            };
            Some(dir)
        }
        _ => None,
    };

    {
        let player = state.store.player_mut(&player_id)?;
        player.energy -= cost;
        player.skill_ready_at.set(slot, now + skill_cooldown_ms(slot));
    }

    state.emit(Recipient::Player(player_id), GameEventData::PlayerUpdate { player_id });
    state.emit(Recipient::All, GameEventData::SkillUsed { player_id, slot });

    let effect = match (archetype, slot) {
        (Archetype::Warrior, SkillSlot::Q) => SkillEffect::Melee(apply_radius_damage(
            state, config, position, MELEE_RADIUS, MELEE_DAMAGE, player_id, now,
        )),
        (Archetype::Mage, SkillSlot::Q) => {
            let direction = bolt_direction?;
            let projectile_id = state.store.spawn_projectile(
                position,
                player_id,
                direction,
                PROJECTILE_SPEED,
                PROJECTILE_LIFESPAN,
            );
            state.emit(Recipient::All, GameEventData::ProjectileCreated { projectile_id });
            SkillEffect::Projectile(projectile_id)
        }
        (Archetype::Warrior, SkillSlot::W) => {
            if let Some(player) = state.store.player_mut(&player_id) {
                let push = PlanarVec::backward_from_yaw(rotation).scale(DASH_DISTANCE);
                player.position = player.position.offset_planar(push);
            }
            state.emit(Recipient::All, GameEventData::PlayerMoved { player_id });
            SkillEffect::Dash
        }
        (Archetype::Mage, SkillSlot::W) => {
            let until = now + SHIELD_DURATION_MS;
            if let Some(player) = state.store.player_mut(&player_id) {
                player.shield_until = until;
            }
            SkillEffect::Shield { until }
        }
        (_, SkillSlot::E) => {
            let restored = state
                .store
                .player_mut(&player_id)
                .map(|p| p.heal(HEAL_AMOUNT))
                .unwrap_or(0);
            SkillEffect::Heal { restored }
        }
        (_, SkillSlot::R) => SkillEffect::Area(apply_radius_damage(
            state, config, position, AREA_RADIUS, AREA_DAMAGE, player_id, now,
        )),
    };

    debug!(player = %player_id.short(), ?slot, ?effect, "Skill used");

    Some(effect)
}

// =============================================================================
// TESTS
// =============================================================================
