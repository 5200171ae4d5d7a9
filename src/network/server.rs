//! WebSocket Game Server
//!
//! Async WebSocket server for the arena. One task per connection reads
//! client frames and applies them to the shared session; a writer task per
//! connection drains its outbound channel; one tick task advances the
//! simulation at a fixed rate.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast, OwnedSemaphorePermit, Semaphore};
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::game::state::PlayerId;
use crate::game::tick::ArenaConfig;
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::network::session::{ArenaSession, SessionError};

/// Port used when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 3001;

/// How long a closing connection may take to flush its queue.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Current wall clock as Unix milliseconds.
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Tick rate for game simulation (Hz).
    pub tick_rate: u32,
    /// Outbound queue length per connection.
    pub outbound_buffer: usize,
    /// Fixed RNG seed; taken from the clock when `None`.
    pub rng_seed: Option<u64>,
    /// Simulation tunables.
    pub arena: ArenaConfig,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            max_connections: 1000,
            tick_rate: crate::TICK_RATE,
            outbound_buffer: 256,
            rng_seed: None,
            arena: ArenaConfig::default(),
            version: crate::VERSION.to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults, with the listen port taken from `PORT` if set.
    pub fn from_env() -> Result<Self, GameServerError> {
        let mut config = Self::default();
        if let Ok(port) = std::env::var("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| GameServerError::InvalidConfig(format!("PORT is not a valid port: {port}")))?;
            config.bind_addr.set_port(port);
        }
        Ok(config)
    }

    /// Reject values the server cannot run with.
    pub fn validate(&self) -> Result<(), GameServerError> {
        if self.tick_rate == 0 || self.tick_rate > 1000 {
            return Err(GameServerError::InvalidConfig(format!(
                "tick_rate must be in 1..=1000, got {}",
                self.tick_rate
            )));
        }
        if self.outbound_buffer == 0 {
            return Err(GameServerError::InvalidConfig("outbound_buffer must be positive".into()));
        }
        if self.max_connections == 0 || self.max_connections > Semaphore::MAX_PERMITS {
            return Err(GameServerError::InvalidConfig(format!(
                "max_connections must be in 1..={}, got {}",
                Semaphore::MAX_PERMITS,
                self.max_connections
            )));
        }
        Ok(())
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection limit reached.
    #[error("Connection limit reached")]
    ConnectionLimitReached,

    /// Session error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// The one arena.
    session: Arc<RwLock<ArenaSession>>,
    /// One permit per open connection, taken at accept time.
    connection_slots: Arc<Semaphore>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(mut config: ServerConfig) -> Result<Self, GameServerError> {
        config.validate()?;
        config.arena.ticks_per_second = config.tick_rate;

        let (shutdown_tx, _) = broadcast::channel(1);
        let seed = config.rng_seed.unwrap_or_else(now_ms);
        let session = ArenaSession::new(seed, config.arena.clone());

        info!(
            seed,
            monsters = session.state().store.monster_count(),
            "Arena created"
        );

        Ok(Self {
            connection_slots: Arc::new(Semaphore::new(config.max_connections)),
            config,
            session: Arc::new(RwLock::new(session)),
            shutdown_tx,
        })
    }

    /// Bind the configured address and run until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.run_on(listener).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn run_on(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!(
            "Arena server v{} listening on {}",
            self.config.version,
            listener.local_addr()?
        );

        let tick_handle = tokio::spawn(Self::run_tick_loop(
            self.session.clone(),
            self.config.tick_rate,
            self.shutdown_tx.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let slot = match self.check_capacity() {
                                Ok(slot) => slot,
                                Err(e) => {
                                    warn!("{}, rejecting {}", e, addr);
                                    continue;
                                }
                            };

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr, slot);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        if let Err(e) = tick_handle.await {
            error!("Tick task failed: {}", e);
        }

        Ok(())
    }

    /// Reserve a connection slot. The slot is held until the permit drops.
    fn check_capacity(&self) -> Result<OwnedSemaphorePermit, GameServerError> {
        self.connection_slots
            .clone()
            .try_acquire_owned()
            .map_err(|_| GameServerError::ConnectionLimitReached)
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr, slot: OwnedSemaphorePermit) {
        let session = self.session.clone();
        let outbound_buffer = self.config.outbound_buffer;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            // Released when this task ends, whatever the exit path
            let _slot = slot;

            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    warn!("Handshake failed for {}: {}", addr, GameServerError::from(e));
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(outbound_buffer);
            let player_id = PlayerId::random();

            // Register client
            if let Err(e) = session.write().await.connect(player_id, msg_tx) {
                error!("Could not register {}: {}", addr, e);
                return;
            }
            info!(player = %player_id.short(), %addr, "Client connected");

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize {}: {}", msg.name(), e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        return;
                    }
                }
                let _ = ws_sender.send(Message::Close(None)).await;
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!(player = %player_id.short(), "Dropped malformed frame: {}", e);
                                        continue;
                                    }
                                };

                                let mut s = session.write().await;
                                if let Err(e) = s.handle_message(player_id, client_msg, now_ms()) {
                                    warn!(player = %player_id.short(), "{}", e);
                                    break;
                                }
                            }
                            Some(Ok(Message::Binary(_))) => {
                                debug!(player = %player_id.short(), "Dropped binary frame");
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }

            // Cleanup: removing the connection drops the session's sender,
            // which lets the writer drain and close.
            if let Err(e) = session.write().await.disconnect(&player_id, now_ms()) {
                debug!(player = %player_id.short(), "{}", e);
            }
            if tokio::time::timeout(FLUSH_TIMEOUT, sender_task).await.is_err() {
                debug!("Client {} did not drain in time", addr);
            }

            info!(player = %player_id.short(), "Client {} cleaned up", addr);
        });
    }

    /// Advance the arena at a fixed rate until shutdown.
    async fn run_tick_loop(
        session: Arc<RwLock<ArenaSession>>,
        tick_rate: u32,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        let tick_duration = Duration::from_micros(1_000_000 / tick_rate as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let mut s = session.write().await;
                    let result = s.run_tick(now_ms());
                    if !result.monsters_died.is_empty() || !result.respawned.is_empty() {
                        debug!(
                            tick = s.current_tick(),
                            died = result.monsters_died.len(),
                            respawned = result.respawned.len(),
                            "Tick"
                        );
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("Tick loop stopped");
                    break;
                }
            }
        }
    }

    /// Tell every client, then stop accepting, ticking, and reading.
    pub async fn shutdown(&self) {
        self.session.read().await.broadcast(ServerMessage::Shutdown {
            reason: "Server shutting down".to_string(),
        });
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.session.read().await.connection_count()
    }

    /// Get joined player count.
    pub async fn player_count(&self) -> usize {
        self.session.read().await.player_count()
    }

    /// Get monster count.
    pub async fn monster_count(&self) -> usize {
        self.session.read().await.state().store.monster_count()
    }

    /// Get current tick.
    pub async fn current_tick(&self) -> u64 {
        self.session.read().await.current_tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            rng_seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.arena.initial_monsters, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ServerConfig { tick_rate: 0, ..test_config() };
        assert!(matches!(GameServer::new(config), Err(GameServerError::InvalidConfig(_))));

        let config = ServerConfig { outbound_buffer: 0, ..test_config() };
        assert!(matches!(config.validate(), Err(GameServerError::InvalidConfig(_))));
    }

    #[test]
    fn test_slots_reserved_at_accept() {
        let config = ServerConfig { max_connections: 2, ..test_config() };
        let server = GameServer::new(config).unwrap();

        let first = server.check_capacity().unwrap();
        let _second = server.check_capacity().unwrap();
        assert!(matches!(
            server.check_capacity(),
            Err(GameServerError::ConnectionLimitReached)
        ));

        drop(first);
        assert!(server.check_capacity().is_ok());
    }

    #[tokio::test]
    async fn test_tick_rate_feeds_arena() {
        let config = ServerConfig { tick_rate: 30, ..test_config() };
        let server = GameServer::new(config).unwrap();

        assert_eq!(server.session.read().await.config().ticks_per_second, 30);
    }

    #[test]
    fn test_now_ms_is_recent() {
        // 2020-01-01 in Unix ms
        assert!(now_ms() > 1_577_836_800_000);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(test_config()).unwrap();

        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.player_count().await, 0);
        assert_eq!(server.monster_count().await, 5);
        assert_eq!(server.current_tick().await, 0);
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let server = Arc::new(GameServer::new(test_config()).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let runner = server.clone();
        let handle = tokio::spawn(async move { runner.run_on(listener).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(server.current_tick().await > 0);

        server.shutdown().await;
        let result = tokio::time::timeout(Duration::from_secs(2), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
