//! Entity Store
//!
//! Owns every player, monster, and projectile. The maps are private so all
//! mutation goes through this narrow API; iteration is always ascending by
//! id, which is the tie-break order the rest of the game relies on.

use std::collections::BTreeMap;

use crate::core::vec3::{Vec3, PlanarVec};
use crate::game::state::{
    PlayerId, PlayerState,
    MonsterId, MonsterState,
    ProjectileId, ProjectileState,
};

/// Authoritative entity maps plus id counters.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    players: BTreeMap<PlayerId, PlayerState>,
    monsters: BTreeMap<MonsterId, MonsterState>,
    projectiles: BTreeMap<ProjectileId, ProjectileState>,
    next_monster_id: MonsterId,
    next_projectile_id: ProjectileId,
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Players
    // -------------------------------------------------------------------------

    /// Insert a player, replacing any existing entry with the same id.
    pub fn insert_player(&mut self, player: PlayerState) -> Option<PlayerState> {
        self.players.insert(player.id, player)
    }

    /// Remove a player.
    pub fn remove_player(&mut self, id: &PlayerId) -> Option<PlayerState> {
        self.players.remove(id)
    }

    /// Look up a player.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// Look up a player mutably.
    pub fn player_mut(&mut self, id: &PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(id)
    }

    /// All players, ascending by id.
    pub fn players(&self) -> impl Iterator<Item = &PlayerState> {
        self.players.values()
    }

    /// All players mutably, ascending by id.
    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut PlayerState> {
        self.players.values_mut()
    }

    /// Number of players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    // -------------------------------------------------------------------------
    // Monsters
    // -------------------------------------------------------------------------

    /// Create a monster at `position` with a fresh id.
    pub fn spawn_monster(&mut self, position: Vec3) -> MonsterId {
        let id = self.next_monster_id;
        self.next_monster_id = self.next_monster_id.wrapping_add(1);
        self.monsters.insert(id, MonsterState::new(id, position));
        id
    }

    /// Remove a monster.
    pub fn remove_monster(&mut self, id: MonsterId) -> Option<MonsterState> {
        self.monsters.remove(&id)
    }

    /// Look up a monster.
    pub fn monster(&self, id: MonsterId) -> Option<&MonsterState> {
        self.monsters.get(&id)
    }

    /// Look up a monster mutably.
    pub fn monster_mut(&mut self, id: MonsterId) -> Option<&mut MonsterState> {
        self.monsters.get_mut(&id)
    }

    /// All monsters, ascending by id.
    pub fn monsters(&self) -> impl Iterator<Item = &MonsterState> {
        self.monsters.values()
    }

    /// All monsters mutably, ascending by id.
    pub fn monsters_mut(&mut self) -> impl Iterator<Item = &mut MonsterState> {
        self.monsters.values_mut()
    }

    /// Snapshot of monster ids, ascending.
    pub fn monster_ids(&self) -> Vec<MonsterId> {
        self.monsters.keys().copied().collect()
    }

    /// Number of monsters.
    pub fn monster_count(&self) -> usize {
        self.monsters.len()
    }

    // -------------------------------------------------------------------------
    // Projectiles
    // -------------------------------------------------------------------------

    /// Create a projectile with a fresh id.
    pub fn spawn_projectile(
        &mut self,
        position: Vec3,
        owner: PlayerId,
        direction: PlanarVec,
        speed: f32,
        lifespan: u32,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);
        self.projectiles.insert(
            id,
            ProjectileState::new(id, position, owner, direction, speed, lifespan),
        );
        id
    }

    /// Remove a projectile.
    pub fn remove_projectile(&mut self, id: ProjectileId) -> Option<ProjectileState> {
        self.projectiles.remove(&id)
    }

    /// Look up a projectile.
    pub fn projectile(&self, id: ProjectileId) -> Option<&ProjectileState> {
        self.projectiles.get(&id)
    }

    /// Look up a projectile mutably.
    pub fn projectile_mut(&mut self, id: ProjectileId) -> Option<&mut ProjectileState> {
        self.projectiles.get_mut(&id)
    }

    /// All projectiles, ascending by id.
    pub fn projectiles(&self) -> impl Iterator<Item = &ProjectileState> {
        self.projectiles.values()
    }

    /// Snapshot of projectile ids, ascending.
    pub fn projectile_ids(&self) -> Vec<ProjectileId> {
        self.projectiles.keys().copied().collect()
    }

    /// Number of projectiles.
    pub fn projectile_count(&self) -> usize {
        self.projectiles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::Archetype;

    #[test]
    fn test_monster_ids_monotonic() {
        let mut store = EntityStore::new();
        let a = store.spawn_monster(Vec3::ZERO);
        let b = store.spawn_monster(Vec3::ZERO);
        store.remove_monster(a);
        let c = store.spawn_monster(Vec3::ZERO);

        assert_eq!((a, b, c), (0, 1, 2));
        assert_eq!(store.monster_ids(), vec![1, 2]);
    }

    #[test]
    fn test_projectile_ids_never_reused() {
        let mut store = EntityStore::new();
        let owner = PlayerId::new([1; 16]);
        let a = store.spawn_projectile(Vec3::ZERO, owner, PlanarVec::new(1.0, 0.0), 0.3, 100);
        store.remove_projectile(a);
        let b = store.spawn_projectile(Vec3::ZERO, owner, PlanarVec::new(1.0, 0.0), 0.3, 100);

        assert_ne!(a, b);
        assert_eq!(store.projectile_count(), 1);
        assert_eq!(store.projectile(b).map(|p| p.owner), Some(owner));
    }

    #[test]
    fn test_players_iterate_in_id_order() {
        let mut store = EntityStore::new();
        for byte in [9u8, 3, 6] {
            let id = PlayerId::new([byte; 16]);
            store.insert_player(PlayerState::new(id, Archetype::Mage, Vec3::ZERO));
        }

        let order: Vec<u8> = store.players().map(|p| p.id.0[0]).collect();
        assert_eq!(order, vec![3, 6, 9]);
        assert_eq!(store.player_count(), 3);
    }

    #[test]
    fn test_insert_player_replaces() {
        let mut store = EntityStore::new();
        let id = PlayerId::new([1; 16]);
        assert!(store.insert_player(PlayerState::new(id, Archetype::Mage, Vec3::ZERO)).is_none());

        let previous = store.insert_player(PlayerState::new(id, Archetype::Warrior, Vec3::ZERO));
        assert_eq!(previous.map(|p| p.archetype), Some(Archetype::Mage));
        assert_eq!(store.player(&id).map(|p| p.archetype), Some(Archetype::Warrior));
        assert_eq!(store.player_count(), 1);
    }

    #[test]
    fn test_remove_unknown_is_none() {
        let mut store = EntityStore::new();
        assert!(store.remove_player(&PlayerId::new([1; 16])).is_none());
        assert!(store.remove_monster(42).is_none());
        assert!(store.remove_projectile(42).is_none());
    }
}
