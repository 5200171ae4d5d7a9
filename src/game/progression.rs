//! Progression
//!
//! Experience and levelling. Each level raises max health by 20 and max
//! energy by 10 and refills both.

use tracing::info;

use crate::game::state::PlayerState;

/// Max health gained per level.
pub const HEALTH_PER_LEVEL: u32 = 20;

/// Max energy gained per level.
pub const ENERGY_PER_LEVEL: u32 = 10;

/// Experience required to advance from `level`: `100 * level^1.5`.
#[inline]
pub fn xp_for_level(level: u32) -> f32 {
    100.0 * (level as f32).powf(1.5)
}

/// Add experience and apply every level-up it pays for.
///
/// Returns the number of levels gained. Negative or non-finite amounts are
/// ignored.
pub fn grant_xp(player: &mut PlayerState, amount: f32) -> u32 {
    if !amount.is_finite() || amount <= 0.0 {
        return 0;
    }

    player.xp += amount;

    let mut gained = 0;
    while player.xp >= player.xp_to_next_level {
        player.xp -= player.xp_to_next_level;
        player.level += 1;
        player.xp_to_next_level = xp_for_level(player.level);
        player.max_health += HEALTH_PER_LEVEL;
        player.max_energy += ENERGY_PER_LEVEL;
        player.restore_full();
        gained += 1;
    }

    if gained > 0 {
        info!(
            player = %player.id.short(),
            level = player.level,
            "Player levelled up"
        );
    }

    gained
}
