//! Monster Behaviour
//!
//! Each tick a monster is either dead (removed, killer rewarded), attacking
//! the nearest living player in range, or walking toward them.

use tracing::{debug, info};

use crate::game::combat::damage_player;
use crate::game::events::{GameEventData, Recipient};
use crate::game::progression::grant_xp;
use crate::game::state::{ArenaState, MonsterId, PlayerId};
use crate::game::tick::ArenaConfig;

/// Reach of a monster's attack (inclusive).
pub const MONSTER_ATTACK_RANGE: f32 = 1.2;

/// Damage per attack.
pub const MONSTER_ATTACK_DAMAGE: u32 = 10;

/// Time between attacks.
pub const MONSTER_ATTACK_COOLDOWN_MS: u64 = 2_000;

/// Experience awarded to the killer.
pub const MONSTER_KILL_XP: f32 = 30.0;

/// Run every monster for one tick, in ascending id order.
///
/// Returns the ids of monsters removed this tick.
pub fn process_monsters(
    state: &mut ArenaState,
    config: &ArenaConfig,
    now: u64,
) -> Vec<MonsterId> {
    let mut died = Vec::new();

    for monster_id in state.store.monster_ids() {
        let Some((dead, position, attack_ready_at)) = state
            .store
            .monster(monster_id)
            .map(|m| (m.is_dead(), m.position, m.attack_ready_at))
        else {
            continue;
        };

        if dead {
            reap_monster(state, monster_id);
            died.push(monster_id);
            continue;
        }

        let Some((target_id, distance)) = nearest_living_player(state, monster_id) else {
            continue;
        };

        if distance <= MONSTER_ATTACK_RANGE {
            if now >= attack_ready_at {
                damage_player(state, config, target_id, MONSTER_ATTACK_DAMAGE, now);
                if let Some(monster) = state.store.monster_mut(monster_id) {
                    monster.attack_ready_at = now + MONSTER_ATTACK_COOLDOWN_MS;
                }
                state.emit(Recipient::All, GameEventData::MonsterAttacked { monster_id });
                debug!(monster_id, target = %target_id.short(), "Monster attacked");
            }
            continue;
        }

        let Some(target_position) = state.store.player(&target_id).map(|p| p.position) else {
            continue;
        };
        if let Some(direction) = position.planar_delta(target_position).normalize() {
            if let Some(monster) = state.store.monster_mut(monster_id) {
                monster.position = position.offset_planar(direction.scale(monster.speed));
            }
        }
    }

    if state.store.monster_count() > 0 {
        state.emit(Recipient::All, GameEventData::MonstersUpdate);
    }

    died
}

/// Remove a dead monster and credit its last hitter, if still connected.
fn reap_monster(state: &mut ArenaState, monster_id: MonsterId) {
    let Some(monster) = state.store.remove_monster(monster_id) else {
        return;
    };

    if let Some(killer_id) = monster.last_hit_by {
        if let Some(killer) = state.store.player_mut(&killer_id) {
            grant_xp(killer, MONSTER_KILL_XP);
            state.emit(
                Recipient::Player(killer_id),
                GameEventData::PlayerUpdate { player_id: killer_id },
            );
        }
    }

    state.emit(Recipient::All, GameEventData::MonsterDied { monster_id });
    info!(
        monster_id,
        killer = ?monster.last_hit_by.map(|id| id.short()),
        "Monster died"
    );
}

/// Nearest non-downed player by planar distance. Ties keep the lower id.
fn nearest_living_player(state: &ArenaState, monster_id: MonsterId) -> Option<(PlayerId, f32)> {
    let origin = state.store.monster(monster_id)?.position;

    let mut best: Option<(PlayerId, f32)> = None;
    for player in state.store.players().filter(|p| !p.is_downed()) {
        let distance = origin.planar_distance(player.position);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((player.id, distance)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec3::Vec3;
    use crate::game::state::{Archetype, PlayerState};

    fn setup_with_player(position: Vec3) -> (ArenaState, ArenaConfig, PlayerId) {
        let mut state = ArenaState::new(1);
        let id = PlayerId::new([1; 16]);
        state.store.insert_player(PlayerState::new(id, Archetype::Warrior, position));
        (state, ArenaConfig::default(), id)
    }

    #[test]
    fn test_monster_attack_scenario() {
        let (mut state, config, player) = setup_with_player(Vec3::new(1.0, 1.5, 0.0));
        let m = state.store.spawn_monster(Vec3::new(0.0, 0.5, 0.0));

        process_monsters(&mut state, &config, 10_000);
        assert_eq!(state.store.player(&player).unwrap().health, 90);
        assert_eq!(state.store.monster(m).unwrap().attack_ready_at, 12_000);

        let events = state.take_events();
        assert!(events.iter().any(|e| e.data == GameEventData::MonsterAttacked { monster_id: m }));
        assert!(events.iter().any(|e| e.recipient == Recipient::Player(player)
            && e.data == GameEventData::PlayerUpdate { player_id: player }));

        // Within the cooldown it holds position and does not attack
        for now in [10_016, 11_000, 11_999] {
            process_monsters(&mut state, &config, now);
        }
        assert_eq!(state.store.player(&player).unwrap().health, 90);
        assert_eq!(state.store.monster(m).unwrap().position, Vec3::new(0.0, 0.5, 0.0));

        process_monsters(&mut state, &config, 12_000);
        assert_eq!(state.store.player(&player).unwrap().health, 80);
    }

    #[test]
    fn test_monster_seeks_nearest() {
        let (mut state, config, _) = setup_with_player(Vec3::new(10.0, 1.5, 0.0));
        let m = state.store.spawn_monster(Vec3::new(0.0, 0.5, 0.0));

        process_monsters(&mut state, &config, 0);

        let pos = state.store.monster(m).unwrap().position;
        assert!((pos.x - 0.02).abs() < 1e-6);
        assert_eq!(pos.z, 0.0);
        assert_eq!(pos.y, 0.5);
    }

    #[test]
    fn test_tie_goes_to_lower_id() {
        let mut state = ArenaState::new(1);
        let config = ArenaConfig::default();
        let low = PlayerId::new([1; 16]);
        let high = PlayerId::new([2; 16]);
        state.store.insert_player(PlayerState::new(high, Archetype::Mage, Vec3::new(-1.0, 1.5, 0.0)));
        state.store.insert_player(PlayerState::new(low, Archetype::Mage, Vec3::new(1.0, 1.5, 0.0)));
        state.store.spawn_monster(Vec3::new(0.0, 0.5, 0.0));

        process_monsters(&mut state, &config, 0);

        assert_eq!(state.store.player(&low).unwrap().health, 90);
        assert_eq!(state.store.player(&high).unwrap().health, 100);
    }

    #[test]
    fn test_idle_without_living_players() {
        let (mut state, config, player) = setup_with_player(Vec3::new(5.0, 1.5, 0.0));
        state.store.player_mut(&player).unwrap().respawn_at = Some(99_999);
        let m = state.store.spawn_monster(Vec3::new(0.0, 0.5, 0.0));

        process_monsters(&mut state, &config, 0);

        assert_eq!(state.store.monster(m).unwrap().position, Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_dead_monster_removed_and_killer_credited() {
        let (mut state, config, killer) = setup_with_player(Vec3::new(15.0, 1.5, 0.0));
        let m = state.store.spawn_monster(Vec3::new(0.0, 0.5, 0.0));
        {
            let monster = state.store.monster_mut(m).unwrap();
            monster.health = -5;
            monster.last_hit_by = Some(killer);
        }

        let died = process_monsters(&mut state, &config, 0);

        assert_eq!(died, vec![m]);
        assert!(state.store.monster(m).is_none());
        assert_eq!(state.store.player(&killer).unwrap().xp, 30.0);

        let events = state.take_events();
        let deaths = events
            .iter()
            .filter(|e| e.data == GameEventData::MonsterDied { monster_id: m })
            .count();
        assert_eq!(deaths, 1);
        // No live monsters left, so no bulk update
        assert!(!events.iter().any(|e| e.data == GameEventData::MonstersUpdate));
    }

    #[test]
    fn test_departed_killer_gets_nothing() {
        let mut state = ArenaState::new(1);
        let config = ArenaConfig::default();
        let m = state.store.spawn_monster(Vec3::ZERO);
        {
            let monster = state.store.monster_mut(m).unwrap();
            monster.health = 0;
            monster.last_hit_by = Some(PlayerId::new([3; 16]));
        }

        assert_eq!(process_monsters(&mut state, &config, 0), vec![m]);
        let events = state.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, GameEventData::MonsterDied { monster_id: m });
    }

    #[test]
    fn test_kill_xp_triggers_level_up() {
        let (mut state, config, killer) = setup_with_player(Vec3::new(15.0, 1.5, 0.0));
        state.store.player_mut(&killer).unwrap().xp = 80.0;
        let m = state.store.spawn_monster(Vec3::ZERO);
        {
            let monster = state.store.monster_mut(m).unwrap();
            monster.health = 0;
            monster.last_hit_by = Some(killer);
        }

        process_monsters(&mut state, &config, 0);

        let player = state.store.player(&killer).unwrap();
        assert_eq!(player.level, 2);
        assert_eq!(player.max_health, 120);
        assert_eq!(player.health, 120);
    }
}
