//! Arena Session
//!
//! Owns the arena simulation plus one outbound channel per connection, and
//! turns game events into targeted protocol messages. The server wraps it
//! in a single `RwLock`; every method here runs under the write lock and
//! only enqueues outbound messages, never awaits.

use std::collections::BTreeMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::game::command::{apply_command, remove_player, CommandOutcome};
use crate::game::events::{GameEvent, GameEventData, Recipient};
use crate::game::state::{ArenaState, PlayerId};
use crate::game::tick::{tick, ArenaConfig, TickResult};
use crate::network::protocol::{
    ClientMessage, ServerMessage, PlayerSnapshot, MonsterSnapshot,
    ProjectileSnapshot, SkillUsedInfo, PongInfo,
};

/// The live arena and its audience.
pub struct ArenaSession {
    /// Simulation state.
    state: ArenaState,
    /// Simulation tunables.
    config: ArenaConfig,
    /// Outbound channel per connection.
    connections: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>,
}

impl ArenaSession {
    /// Create a session with a freshly stocked arena.
    pub fn new(rng_seed: u64, config: ArenaConfig) -> Self {
        let mut state = ArenaState::new(rng_seed);
        state.spawn_monsters(config.initial_monsters);

        Self {
            state,
            config,
            connections: BTreeMap::new(),
        }
    }

    /// Register a connection's outbound channel.
    pub fn connect(
        &mut self,
        player_id: PlayerId,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<(), SessionError> {
        if self.connections.contains_key(&player_id) {
            return Err(SessionError::DuplicateConnection);
        }
        self.connections.insert(player_id, sender);
        Ok(())
    }

    /// Drop a connection and its player, and tell everyone else.
    pub fn disconnect(&mut self, player_id: &PlayerId, now: u64) -> Result<(), SessionError> {
        if self.connections.remove(player_id).is_none() {
            return Err(SessionError::UnknownConnection);
        }

        remove_player(&mut self.state, *player_id);
        let events = self.state.take_events();
        self.dispatch(&events, now);
        Ok(())
    }

    /// Apply one decoded client message and send out what it caused.
    pub fn handle_message(
        &mut self,
        player_id: PlayerId,
        message: ClientMessage,
        now: u64,
    ) -> Result<CommandOutcome, SessionError> {
        if !self.connections.contains_key(&player_id) {
            return Err(SessionError::UnknownConnection);
        }

        if let ClientMessage::Ping { timestamp } = message {
            self.send_to(
                &player_id,
                ServerMessage::Pong(PongInfo { timestamp, server_time: now }),
            );
            return Ok(CommandOutcome::Ignored);
        }

        let Some(command) = message.to_command() else {
            return Ok(CommandOutcome::Ignored);
        };

        let outcome = apply_command(&mut self.state, &self.config, player_id, command, now);
        let events = self.state.take_events();
        self.dispatch(&events, now);

        Ok(outcome)
    }

    /// Run a single game tick and send out its events.
    pub fn run_tick(&mut self, now: u64) -> TickResult {
        let result = tick(&mut self.state, &self.config, now);
        self.dispatch(&result.events, now);
        result
    }

    /// Send a message to every connection.
    pub fn broadcast(&self, message: ServerMessage) {
        for player_id in self.connections.keys() {
            self.send_to(player_id, message.clone());
        }
    }

    /// Number of open connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of players in the arena.
    pub fn player_count(&self) -> usize {
        self.state.store.player_count()
    }

    /// Current tick.
    pub fn current_tick(&self) -> u64 {
        self.state.tick
    }

    /// Read-only view of the simulation.
    pub fn state(&self) -> &ArenaState {
        &self.state
    }

    /// Simulation tunables.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Deliver events to their recipients.
    fn dispatch(&self, events: &[GameEvent], now: u64) {
        for event in events {
            let Some(message) = self.render(&event.data, now) else {
                continue;
            };

            match event.recipient {
                Recipient::Player(player_id) => self.send_to(&player_id, message),
                recipient => {
                    for player_id in self.connections.keys() {
                        if recipient.includes(player_id) {
                            self.send_to(player_id, message.clone());
                        }
                    }
                }
            }
        }
    }

    /// Resolve an event against the current store. `None` if the entity it
    /// refers to is already gone.
    fn render(&self, data: &GameEventData, now: u64) -> Option<ServerMessage> {
        let store = &self.state.store;
        let player = |id: &PlayerId| store.player(id).map(|p| PlayerSnapshot::capture(p, now));

        let message = match data {
            GameEventData::CurrentPlayers => ServerMessage::CurrentPlayers(
                store
                    .players()
                    .map(|p| (p.id, PlayerSnapshot::capture(p, now)))
                    .collect(),
            ),
            GameEventData::NewPlayer { player_id } => ServerMessage::NewPlayer(player(player_id)?),
            GameEventData::PlayerDisconnected { player_id } => {
                ServerMessage::PlayerDisconnected(*player_id)
            }
            GameEventData::PlayerMoved { player_id } => ServerMessage::PlayerMoved(player(player_id)?),
            GameEventData::PlayerUpdate { player_id } => ServerMessage::PlayerUpdate(player(player_id)?),
            GameEventData::SkillUsed { player_id, slot } => ServerMessage::SkillUsed(SkillUsedInfo {
                player_id: *player_id,
                skill_id: *slot,
            }),
            GameEventData::MonstersCreated => ServerMessage::MonstersCreated(
                store.monsters().map(|m| (m.id, MonsterSnapshot::capture(m))).collect(),
            ),
            GameEventData::MonstersUpdate => ServerMessage::MonstersUpdate(
                store.monsters().map(|m| (m.id, MonsterSnapshot::capture(m))).collect(),
            ),
            GameEventData::MonsterDied { monster_id } => ServerMessage::MonsterDied(*monster_id),
            GameEventData::MonsterAttacked { monster_id } => ServerMessage::MonsterAttacked(*monster_id),
            GameEventData::ProjectileCreated { projectile_id } => ServerMessage::ProjectileCreated(
                ProjectileSnapshot::capture(store.projectile(*projectile_id)?),
            ),
            GameEventData::ProjectilesUpdate => ServerMessage::ProjectilesUpdate(
                store
                    .projectiles()
                    .map(|p| (p.id, ProjectileSnapshot::capture(p)))
                    .collect(),
            ),
            GameEventData::ProjectileDestroyed { projectile_id } => {
                ServerMessage::ProjectileDestroyed(*projectile_id)
            }
        };

        Some(message)
    }

    /// Enqueue without waiting. A full or closed channel drops the message.
    fn send_to(&self, player_id: &PlayerId, message: ServerMessage) {
        let Some(sender) = self.connections.get(player_id) else {
            return;
        };

        match sender.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                warn!(
                    player = %player_id.short(),
                    event = message.name(),
                    "Outbound channel full, dropping message"
                );
            }
            Err(TrySendError::Closed(message)) => {
                debug!(
                    player = %player_id.short(),
                    event = message.name(),
                    "Outbound channel closed"
                );
            }
        }
    }
}

/// Session errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// A connection with this id is already registered.
    #[error("Connection already registered")]
    DuplicateConnection,

    /// No connection with this id.
    #[error("Unknown connection")]
    UnknownConnection,
}
