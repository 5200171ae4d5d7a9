//! Authoritative Simulation Tick
//!
//! One fixed step of the arena: projectiles, monsters, respawns, energy
//! regeneration, and restocking, in that order. Movement and lifespans are
//! per tick; `now` only feeds cooldowns, shields, and respawn deadlines.

use tracing::info;

use crate::game::events::{GameEvent, GameEventData, Recipient};
use crate::game::monster::process_monsters;
use crate::game::projectile::process_projectiles;
use crate::game::state::{ArenaState, MonsterId, PlayerId, ProjectileId, SkillTimers};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick (and by commands since the last tick)
    pub events: Vec<GameEvent>,
    /// Monsters removed this tick
    pub monsters_died: Vec<MonsterId>,
    /// Projectiles removed this tick
    pub projectiles_destroyed: Vec<ProjectileId>,
    /// Players brought back this tick
    pub respawned: Vec<PlayerId>,
    /// Monsters spawned by a restock this tick
    pub restocked: Vec<MonsterId>,
}

/// Simulation tunables.
#[derive(Clone, Debug)]
pub struct ArenaConfig {
    /// Monsters spawned when the arena is created
    pub initial_monsters: u32,
    /// Monsters spawned when the last one dies
    pub restock_batch: u32,
    /// Whether to restock at all
    pub restock_enabled: bool,
    /// How long a downed player waits (ms)
    pub respawn_delay_ms: u64,
    /// Energy regained per simulated second
    pub energy_regen_per_second: u32,
    /// Ticks in one simulated second (the server's tick rate)
    pub ticks_per_second: u32,
    /// Multiplier on damage taken while shielded (0.0 = immune)
    pub shield_damage_factor: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_monsters: 5,
            restock_batch: 5,
            restock_enabled: true,
            respawn_delay_ms: 5_000,
            energy_regen_per_second: 10,
            ticks_per_second: crate::TICK_RATE,
            shield_damage_factor: 0.0,
        }
    }
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `state` - The arena state (will be mutated)
/// * `config` - Arena tunables
/// * `now` - Current time (Unix ms)
///
/// # Determinism
///
/// Entities are visited in ascending id order and all randomness comes
/// from `state.rng`, so equal inputs give equal states.
pub fn tick(state: &mut ArenaState, config: &ArenaConfig, now: u64) -> TickResult {
    let mut result = TickResult::default();

    // 0. Advance tick counter
    state.tick += 1;

    // 1. Move projectiles and resolve hits
    result.projectiles_destroyed = process_projectiles(state, config, now);

    // 2. Reap, attack, or seek
    result.monsters_died = process_monsters(state, config, now);

    // 3. Bring back downed players whose timer ran out
    result.respawned = process_respawns(state, now);

    // 4. Energy regeneration, once per simulated second
    let second_elapsed = config.ticks_per_second > 0
        && state.tick % config.ticks_per_second as u64 == 0;
    if second_elapsed {
        regenerate_energy(state, config);
    }

    // 5. Refill an emptied arena
    if config.restock_enabled
        && !result.monsters_died.is_empty()
        && state.store.monster_count() == 0
    {
        result.restocked = state.spawn_monsters(config.restock_batch);
        state.emit(Recipient::All, GameEventData::MonstersCreated);
        info!(count = result.restocked.len(), "Arena restocked");
    }

    #[cfg(feature = "debug-tracing")]
    if second_elapsed {
        tracing::trace!(
            tick = state.tick,
            hash = %hex::encode(state.compute_hash()),
            "State digest"
        );
    }

    // Collect events
    result.events = state.take_events();

    result
}

/// Respawn every downed player with `respawn_at <= now`.
fn process_respawns(state: &mut ArenaState, now: u64) -> Vec<PlayerId> {
    let due: Vec<PlayerId> = state
        .store
        .players()
        .filter(|p| p.respawn_at.is_some_and(|at| now >= at))
        .map(|p| p.id)
        .collect();

    for &player_id in &due {
        let spawn = state.random_player_spawn();
        if let Some(player) = state.store.player_mut(&player_id) {
            player.position = spawn;
            player.restore_full();
            player.shield_until = 0;
            player.skill_ready_at = SkillTimers::default();
            player.respawn_at = None;
        }
        state.emit(Recipient::All, GameEventData::PlayerMoved { player_id });
        state.emit(Recipient::Player(player_id), GameEventData::PlayerUpdate { player_id });
        info!(player = %player_id.short(), "Player respawned");
    }

    due
}

/// Give every living player their per-second energy.
fn regenerate_energy(state: &mut ArenaState, config: &ArenaConfig) {
    let mut changed = Vec::new();
    for player in state.store.players_mut() {
        if player.is_downed() {
            continue;
        }
        if player.restore_energy(config.energy_regen_per_second) > 0 {
            changed.push(player.id);
        }
    }

    for player_id in changed {
        state.emit(Recipient::Player(player_id), GameEventData::PlayerUpdate { player_id });
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec3::{Vec3, PlanarVec};
    use crate::game::command::{apply_command, remove_player, PlayerCommand};
    use crate::game::state::{Archetype, SkillSlot};
    use proptest::prelude::*;

    const A: PlayerId = PlayerId::new([1; 16]);
    const B: PlayerId = PlayerId::new([2; 16]);

    /// 60 Hz frame time, rounded to whole milliseconds.
    const FRAME_MS: u64 = 16;

    fn arena(seed: u64) -> (ArenaState, ArenaConfig) {
        let config = ArenaConfig::default();
        let mut state = ArenaState::new(seed);
        state.spawn_monsters(config.initial_monsters);
        (state, config)
    }

    #[test]
    fn test_tick_increments() {
        let (mut state, config) = arena(1);
        tick(&mut state, &config, 0);
        tick(&mut state, &config, FRAME_MS);
        assert_eq!(state.tick, 2);
    }

    #[test]
    fn test_tick_collects_command_events() {
        let (mut state, config) = arena(1);
        apply_command(&mut state, &config, A, PlayerCommand::Join(Archetype::Mage), 0);

        let result = tick(&mut state, &config, 0);
        assert!(result.events.iter().any(|e| e.data == GameEventData::CurrentPlayers));
        assert!(result.events.iter().any(|e| e.data == GameEventData::MonstersUpdate));
        assert!(state.pending_events().is_empty());
    }

    #[test]
    fn test_energy_regen_once_per_second() {
        let (mut state, config) = arena(1);
        apply_command(&mut state, &config, A, PlayerCommand::Join(Archetype::Warrior), 0);
        state.store.player_mut(&A).unwrap().energy = 50;

        for i in 0..(config.ticks_per_second as u64 - 1) {
            tick(&mut state, &config, i * FRAME_MS);
        }
        assert_eq!(state.store.player(&A).unwrap().energy, 50);

        let result = tick(&mut state, &config, 1_000);
        assert_eq!(state.store.player(&A).unwrap().energy, 60);
        assert!(result.events.iter().any(|e| e.recipient == Recipient::Player(A)
            && e.data == GameEventData::PlayerUpdate { player_id: A }));
    }

    #[test]
    fn test_energy_regen_follows_tick_rate() {
        let (mut state, mut config) = arena(1);
        config.ticks_per_second = 30;
        apply_command(&mut state, &config, A, PlayerCommand::Join(Archetype::Mage), 0);
        state.store.player_mut(&A).unwrap().energy = 50;

        for i in 0..29u64 {
            tick(&mut state, &config, i * 33);
        }
        assert_eq!(state.store.player(&A).unwrap().energy, 50);

        tick(&mut state, &config, 1_000);
        assert_eq!(state.store.player(&A).unwrap().energy, 60);

        // Zero disables regen instead of dividing by zero
        config.ticks_per_second = 0;
        tick(&mut state, &config, 1_033);
        assert_eq!(state.store.player(&A).unwrap().energy, 60);
    }

    #[test]
    fn test_downed_player_respawns() {
        let (mut state, config) = arena(1);
        apply_command(&mut state, &config, A, PlayerCommand::Join(Archetype::Mage), 0);
        {
            let p = state.store.player_mut(&A).unwrap();
            p.health = 0;
            p.energy = 3;
            p.respawn_at = Some(5_000);
            p.shield_until = 9_000;
            p.skill_ready_at.set(SkillSlot::R, 20_000);
            p.level = 3;
        }

        let result = tick(&mut state, &config, 4_999);
        assert!(result.respawned.is_empty());

        let result = tick(&mut state, &config, 5_000);
        assert_eq!(result.respawned, vec![A]);

        let p = state.store.player(&A).unwrap();
        assert!(!p.is_downed());
        assert_eq!(p.health, p.max_health);
        assert_eq!(p.energy, p.max_energy);
        assert_eq!(p.shield_until, 0);
        assert_eq!(p.skill_ready_at, SkillTimers::default());
        assert_eq!(p.level, 3);
        assert!(result.events.iter().any(|e| e.recipient == Recipient::All
            && e.data == GameEventData::PlayerMoved { player_id: A }));
    }

    #[test]
    fn test_restock_after_last_monster_dies() {
        let mut state = ArenaState::new(1);
        let config = ArenaConfig::default();
        let m = state.store.spawn_monster(Vec3::ZERO);
        state.store.monster_mut(m).unwrap().health = -1;

        let result = tick(&mut state, &config, 0);

        assert_eq!(result.monsters_died, vec![m]);
        assert_eq!(result.restocked.len(), config.restock_batch as usize);
        assert_eq!(state.store.monster_count(), config.restock_batch as usize);
        assert!(!result.restocked.contains(&m));
        assert!(result.events.iter().any(|e| e.data == GameEventData::MonstersCreated));
    }

    #[test]
    fn test_no_restock_when_disabled_or_empty_from_start() {
        let mut state = ArenaState::new(1);
        let mut config = ArenaConfig::default();
        tick(&mut state, &config, 0);
        assert_eq!(state.store.monster_count(), 0);

        config.restock_enabled = false;
        let m = state.store.spawn_monster(Vec3::ZERO);
        state.store.monster_mut(m).unwrap().health = 0;
        tick(&mut state, &config, 0);
        assert_eq!(state.store.monster_count(), 0);
    }

    #[test]
    fn test_projectile_kill_reaped_same_tick() {
        let mut state = ArenaState::new(1);
        let config = ArenaConfig { restock_enabled: false, ..ArenaConfig::default() };
        apply_command(&mut state, &config, A, PlayerCommand::Join(Archetype::Mage), 0);
        let origin = state.store.player(&A).unwrap().position;
        let m = state.store.spawn_monster(origin.offset_planar(PlanarVec::new(0.5, 0.0)));
        state.store.monster_mut(m).unwrap().health = 10;

        apply_command(
            &mut state, &config, A,
            PlayerCommand::Skill { slot: SkillSlot::Q, direction: Some(PlanarVec::new(1.0, 0.0)) },
            0,
        );

        // Projectiles resolve before monsters, so the kill lands in one tick
        let result = tick(&mut state, &config, 0);
        assert_eq!(result.projectiles_destroyed.len(), 1);
        assert_eq!(result.monsters_died, vec![m]);
        assert!(state.store.monster(m).is_none());
        assert_eq!(state.store.player(&A).unwrap().xp, 30.0);
        assert!(result.restocked.is_empty());
    }

    #[test]
    fn test_same_inputs_same_hash() {
        let run = || {
            let (mut state, config) = arena(4242);
            apply_command(&mut state, &config, A, PlayerCommand::Join(Archetype::Warrior), 0);
            apply_command(&mut state, &config, B, PlayerCommand::Join(Archetype::Mage), 0);
            for i in 0..600u64 {
                let now = i * FRAME_MS;
                if i % 50 == 0 {
                    apply_command(
                        &mut state, &config, B,
                        PlayerCommand::Skill { slot: SkillSlot::Q, direction: Some(PlanarVec::new(1.0, 1.0)) },
                        now,
                    );
                    apply_command(
                        &mut state, &config, A,
                        PlayerCommand::Skill { slot: SkillSlot::R, direction: None },
                        now,
                    );
                }
                tick(&mut state, &config, now);
            }
            state.compute_hash()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_different_seeds_different_hash() {
        let (a, _) = arena(1);
        let (b, _) = arena(2);
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[derive(Clone, Debug)]
    enum Step {
        Tick(u64),
        Skill(bool, SkillSlot, f32, f32),
        Move(bool, f32, f32),
        Leave(bool),
        Join(bool, bool),
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        let slot = prop_oneof![
            Just(SkillSlot::Q),
            Just(SkillSlot::W),
            Just(SkillSlot::E),
            Just(SkillSlot::R),
        ];
        prop_oneof![
            4 => (0u64..3_000).prop_map(Step::Tick),
            3 => (any::<bool>(), slot, -1.0f32..1.0, -1.0f32..1.0)
                .prop_map(|(who, s, x, z)| Step::Skill(who, s, x, z)),
            2 => (any::<bool>(), -5.0f32..5.0, -5.0f32..5.0)
                .prop_map(|(who, x, z)| Step::Move(who, x, z)),
            1 => any::<bool>().prop_map(Step::Leave),
            1 => (any::<bool>(), any::<bool>()).prop_map(|(who, mage)| Step::Join(who, mage)),
        ]
    }

    proptest! {
        #[test]
        fn test_bounds_hold_under_random_play(steps in prop::collection::vec(step_strategy(), 1..200)) {
            let (mut state, config) = arena(99);
            apply_command(&mut state, &config, A, PlayerCommand::Join(Archetype::Warrior), 0);
            apply_command(&mut state, &config, B, PlayerCommand::Join(Archetype::Mage), 0);

            let mut now = 0u64;
            for step in steps {
                match step {
                    Step::Tick(dt) => {
                        now += dt;
                        tick(&mut state, &config, now);
                    }
                    Step::Skill(who, slot, x, z) => {
                        let id = if who { A } else { B };
                        let cmd = PlayerCommand::Skill { slot, direction: Some(PlanarVec::new(x, z)) };
                        apply_command(&mut state, &config, id, cmd, now);
                    }
                    Step::Move(who, x, z) => {
                        let id = if who { A } else { B };
                        let cmd = PlayerCommand::Move { position: Vec3::new(x, 1.5, z), rotation: x };
                        apply_command(&mut state, &config, id, cmd, now);
                    }
                    Step::Leave(who) => {
                        remove_player(&mut state, if who { A } else { B });
                    }
                    Step::Join(who, mage) => {
                        let archetype = if mage { Archetype::Mage } else { Archetype::Warrior };
                        apply_command(&mut state, &config, if who { A } else { B }, PlayerCommand::Join(archetype), now);
                    }
                }

                for p in state.store.players() {
                    prop_assert!(p.health <= p.max_health);
                    prop_assert!(p.energy <= p.max_energy);
                    prop_assert!(p.level >= 1);
                    prop_assert!(p.xp >= 0.0 && p.xp < p.xp_to_next_level);
                    if p.health == 0 {
                        prop_assert!(p.is_downed());
                    }
                }
                for projectile in state.store.projectiles() {
                    prop_assert!(projectile.lifespan > 0);
                }
            }
        }
    }
}
