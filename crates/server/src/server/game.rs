//! Shared game state: protocol handling and the snapshot broadcast loop.

use crate::config::Config;
use crate::lobby::{LobbyError, LobbyRegistry};
use crate::registry::{GameStateRegistry, HitRejected, epoch_millis};
use crate::store::StoreHandle;
use protocol::{ClientEvent, PlayerId, PlayerRecord, ServerEvent};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

use super::session::{Session, SessionState};

/// Root server state: the registries plus the session table.
///
/// One instance per server, shared behind `Arc<RwLock<_>>`. Connection
/// tasks apply one event per write lock; the broadcast loop snapshots under
/// read locks. Nothing in here ever awaits, so locks are held only for the
/// duration of a map update or a channel push.
pub struct GameState {
    pub config: Config,
    /// Authoritative player records.
    pub registry: GameStateRegistry,
    /// Named broadcast scopes.
    pub lobbies: LobbyRegistry,

    /// Live connections by id.
    sessions: HashMap<PlayerId, Session>,
    /// Fire-and-forget persistence front end.
    store: StoreHandle,
    // ID counter
    next_session_id: PlayerId,
}

impl GameState {
    /// Create a new game state.
    pub fn new(config: Config, store: StoreHandle) -> Self {
        let registry = GameStateRegistry::new(config.game.clone());
        Self {
            config,
            registry,
            lobbies: LobbyRegistry::new(),
            sessions: HashMap::new(),
            store,
            next_session_id: 1,
        }
    }

    /// Register a freshly accepted connection and hand back its id, or
    /// `None` when the server is full.
    ///
    /// The current lobby overview is pushed immediately so the client can
    /// render its lobby picker without asking.
    pub fn add_session(
        &mut self,
        addr: SocketAddr,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> Option<PlayerId> {
        if self.sessions.len() >= self.config.server.max_connections {
            warn!("Connection rejected (limit reached): {}", addr);
            return None;
        }

        let id = self.next_session_id;
        self.next_session_id += 1;
        let session = Session::new(id, addr, tx);
        session.send(ServerEvent::Lobbies(self.lobbies.overview()));
        self.sessions.insert(id, session);
        info!("Connection {} established from {}", id, addr);
        Some(id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Apply one decoded client event.
    ///
    /// `persisted` is the stored record pre-loaded by the connection task
    /// for join events (store reads happen before the state lock is taken);
    /// it is ignored for every other event.
    pub fn handle_event(&mut self, id: PlayerId, event: ClientEvent, persisted: Option<PlayerRecord>) {
        match event {
            ClientEvent::CreateLobby(name) => self.handle_create_lobby(id, &name),
            ClientEvent::JoinLobby(name) => self.handle_join_lobby(id, &name),
            ClientEvent::JoinGame { name } => self.handle_join_game(id, &name, persisted),
            ClientEvent::Move { dx, dy } => self.handle_move(id, dx, dy),
            ClientEvent::PlayerHit(attacker, target) => self.handle_player_hit(id, attacker, target),
        }
    }

    /// Tear down a connection: session, lobby membership, registry record,
    /// persisted record. Safe to call more than once.
    pub fn handle_disconnect(&mut self, id: PlayerId) {
        let Some(session) = self.sessions.remove(&id) else {
            return;
        };
        info!("Connection {} ({}) disconnected", id, session.addr);

        if let Some(lobby_name) = self.lobbies.remove_member(id) {
            self.emit_to_lobby(&lobby_name, ServerEvent::PlayerDisconnected(id));
        }
        if self.registry.remove(id).is_some() {
            self.store.delete(id);
        }
    }

    fn handle_create_lobby(&mut self, id: PlayerId, name: &str) {
        if !self.lobbies.create(name) {
            debug!("Connection {} asked for existing lobby {:?}", id, name);
            return;
        }
        info!("Connection {} created lobby {:?}", id, name);
        self.broadcast_all(ServerEvent::Lobbies(self.lobbies.overview()));
    }

    fn handle_join_lobby(&mut self, id: PlayerId, name: &str) {
        match self.lobbies.join(id, name) {
            Ok(()) => debug!("Connection {} joined lobby {:?}", id, name),
            Err(LobbyError::NotFound(_)) => {
                warn!("Connection {} tried to join unknown lobby {:?}", id, name);
            }
        }
    }

    fn handle_join_game(&mut self, id: PlayerId, name: &str, persisted: Option<PlayerRecord>) {
        if self.sessions.get(&id).is_none_or(|session| session.is_active()) {
            warn!("Ignoring joinGame from connection {} (unknown or already joined)", id);
            return;
        }

        let record = match self.registry.join(id, name, persisted) {
            Ok(record) => record,
            Err(e) => {
                warn!("Join from connection {} refused: {}", id, e);
                return;
            }
        };
        info!("Player {} joined as {:?} with {} health", id, record.name, record.health);
        self.store.save(record.clone());

        if let Some(session) = self.sessions.get_mut(&id) {
            session.state = SessionState::Active;
        }

        // The joiner gets the whole map; its lobby just learns about the
        // newcomer.
        let snapshot = self.registry.snapshot();
        self.send_to(id, ServerEvent::Init { players: snapshot });
        self.emit_to_lobby_of(id, ServerEvent::NewPlayer(record), true);
    }

    fn handle_move(&mut self, id: PlayerId, dx: f64, dy: f64) {
        // Move events arrive every input tick; no per-event logging here.
        if !self.session_is_active(id) {
            return;
        }
        let Some(outcome) = self.registry.apply_move(id, dx, dy) else {
            return;
        };
        if !outcome.moved {
            return;
        }

        self.store.save(outcome.record);
        if let Some(lobby) = self.lobbies.find_by_member(id) {
            let snapshot = self.registry.snapshot_of(&lobby.members);
            self.emit_to_lobby_of(id, ServerEvent::UpdatePlayers(snapshot), false);
        }
    }

    fn handle_player_hit(&mut self, id: PlayerId, attacker: PlayerId, target: PlayerId) {
        if !self.session_is_active(id) {
            debug!("Dropping hit from connection {} before join", id);
            return;
        }

        let result = match self.registry.apply_hit(attacker, target, epoch_millis()) {
            Ok(result) => result,
            Err(e @ HitRejected::UnknownTarget(_)) => {
                warn!("Hit from connection {} dropped: {}", id, e);
                return;
            }
            Err(e) => {
                debug!("Hit from connection {} dropped: {}", id, e);
                return;
            }
        };

        debug!("Player {} hit player {} ({} health left)", attacker, target, result.health);
        if let Some(record) = self.registry.get(target) {
            self.store.save(record.clone());
        }

        let hit = ServerEvent::PlayerHit { id: target, health: result.health };
        self.send_to(attacker, hit.clone());
        if target != attacker {
            self.send_to(target, hit);
        }

        if result.died {
            info!("Player {} was killed by player {}", target, attacker);
            self.send_to(attacker, ServerEvent::PlayerDied(target));
            if target != attacker {
                self.send_to(target, ServerEvent::PlayerDied(target));
            }
        }
    }

    /// Push the periodic per-lobby snapshots: the backstop that keeps idle
    /// clients converged. Move events broadcast the same shape eagerly.
    pub fn broadcast_snapshots(&self) {
        for lobby in self.lobbies.iter() {
            if lobby.members.is_empty() {
                continue;
            }
            let event = ServerEvent::UpdatePlayers(self.registry.snapshot_of(&lobby.members));
            for member in &lobby.members {
                if let Some(session) = self.sessions.get(member) {
                    session.send(event.clone());
                }
            }
        }
    }

    fn session_is_active(&self, id: PlayerId) -> bool {
        self.sessions.get(&id).is_some_and(|session| session.is_active())
    }

    /// Send to one connection, if it is still up.
    fn send_to(&self, id: PlayerId, event: ServerEvent) {
        if let Some(session) = self.sessions.get(&id) {
            session.send(event);
        }
    }

    /// Send to every live connection (lobby list refreshes).
    fn broadcast_all(&self, event: ServerEvent) {
        for session in self.sessions.values() {
            session.send(event.clone());
        }
    }

    /// Send to every current member of the named lobby.
    fn emit_to_lobby(&self, name: &str, event: ServerEvent) {
        let Some(lobby) = self.lobbies.get(name) else {
            return;
        };
        for member in &lobby.members {
            if let Some(session) = self.sessions.get(member) {
                session.send(event.clone());
            }
        }
    }

    /// Send to every member of `id`'s lobby, optionally skipping `id`
    /// itself. No-op for connections outside any lobby.
    fn emit_to_lobby_of(&self, id: PlayerId, event: ServerEvent, skip_origin: bool) {
        let Some(lobby) = self.lobbies.find_by_member(id) else {
            return;
        };
        for member in &lobby.members {
            if skip_origin && *member == id {
                continue;
            }
            if let Some(session) = self.sessions.get(member) {
                session.send(event.clone());
            }
        }
    }
}

/// Drive the fixed-interval snapshot broadcast.
pub async fn run_broadcast_loop(state: Arc<RwLock<GameState>>, interval_ms: u64) {
    let start = Instant::now() + Duration::from_millis(interval_ms);
    let mut ticker = interval_at(start, Duration::from_millis(interval_ms));
    // Skip missed ticks instead of bunching them; clients only ever care
    // about the freshest snapshot.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let state = state.read().await;
        if state.session_count() == 0 {
            // Idle server; back off so an empty process stays quiet.
            drop(state);
            sleep(Duration::from_millis((interval_ms * 4).max(100))).await;
            continue;
        }
        state.broadcast_snapshots();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::store::StoreCommand;
    use protocol::Color;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    fn test_state() -> (GameState, mpsc::UnboundedReceiver<StoreCommand>) {
        test_state_with(Config::default())
    }

    fn test_state_with(config: Config) -> (GameState, mpsc::UnboundedReceiver<StoreCommand>) {
        let (store, store_rx) = StoreHandle::new();
        (GameState::new(config, store), store_rx)
    }

    fn connect(state: &mut GameState) -> (PlayerId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = state.add_session(test_addr(), tx).unwrap();
        (id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn record_at(id: PlayerId, x: f64, y: f64) -> PlayerRecord {
        PlayerRecord {
            id,
            name: format!("p{}", id),
            x,
            y,
            radius: 20.0,
            color: Color::new(9, 9, 9),
            health: 10,
            last_hit_time: 0,
        }
    }

    /// Two connections in one lobby, both joined into the game.
    fn lobby_pair(
        state: &mut GameState,
    ) -> (
        (PlayerId, mpsc::UnboundedReceiver<ServerEvent>),
        (PlayerId, mpsc::UnboundedReceiver<ServerEvent>),
    ) {
        let (a, mut a_rx) = connect(state);
        let (b, mut b_rx) = connect(state);
        state.handle_event(a, ClientEvent::CreateLobby("dusk".to_string()), None);
        state.handle_event(a, ClientEvent::JoinLobby("dusk".to_string()), None);
        state.handle_event(b, ClientEvent::JoinLobby("dusk".to_string()), None);
        state.handle_event(a, ClientEvent::JoinGame { name: "A".to_string() }, Some(record_at(a, 100.0, 100.0)));
        state.handle_event(b, ClientEvent::JoinGame { name: "B".to_string() }, Some(record_at(b, 500.0, 500.0)));
        drain(&mut a_rx);
        drain(&mut b_rx);
        ((a, a_rx), (b, b_rx))
    }

    #[test]
    fn test_connect_pushes_lobby_overview() {
        let (mut state, _store_rx) = test_state();
        let (_, mut rx) = connect(&mut state);
        let events = drain(&mut rx);
        assert_eq!(events, vec![ServerEvent::Lobbies(Vec::new())]);
    }

    #[test]
    fn test_connection_limit() {
        let config = Config {
            server: crate::config::ServerConfig { max_connections: 1, ..Default::default() },
            ..Default::default()
        };
        let (mut state, _store_rx) = test_state_with(config);
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(state.add_session(test_addr(), tx).is_some());
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(state.add_session(test_addr(), tx).is_none());
        assert_eq!(state.session_count(), 1);
    }

    #[test]
    fn test_create_lobby_broadcasts_overview_once() {
        let (mut state, _store_rx) = test_state();
        let (a, mut a_rx) = connect(&mut state);
        let (_b, mut b_rx) = connect(&mut state);
        drain(&mut a_rx);
        drain(&mut b_rx);

        state.handle_event(a, ClientEvent::CreateLobby("dusk".to_string()), None);
        for rx in [&mut a_rx, &mut b_rx] {
            let events = drain(rx);
            assert_eq!(events.len(), 1);
            let ServerEvent::Lobbies(overview) = &events[0] else {
                panic!("expected lobbies refresh, got {:?}", events[0]);
            };
            assert_eq!(overview.len(), 1);
            assert_eq!(overview[0].name, "dusk");
        }

        // Re-creating is a no-op and stays quiet.
        state.handle_event(a, ClientEvent::CreateLobby("dusk".to_string()), None);
        assert!(drain(&mut a_rx).is_empty());
        assert!(drain(&mut b_rx).is_empty());
    }

    #[test]
    fn test_join_game_emits_init_and_new_player() {
        let (mut state, mut store_rx) = test_state();
        let (a, mut a_rx) = connect(&mut state);
        let (b, mut b_rx) = connect(&mut state);
        state.handle_event(a, ClientEvent::CreateLobby("dusk".to_string()), None);
        state.handle_event(a, ClientEvent::JoinLobby("dusk".to_string()), None);
        state.handle_event(b, ClientEvent::JoinLobby("dusk".to_string()), None);
        drain(&mut a_rx);
        drain(&mut b_rx);

        state.handle_event(a, ClientEvent::JoinGame { name: "A".to_string() }, None);

        let a_events = drain(&mut a_rx);
        assert_eq!(a_events.len(), 1);
        let ServerEvent::Init { players } = &a_events[0] else {
            panic!("expected init, got {:?}", a_events[0]);
        };
        assert!(players.contains_key(&a));

        // The other lobby member hears about the newcomer instead.
        let b_events = drain(&mut b_rx);
        assert_eq!(b_events.len(), 1);
        let ServerEvent::NewPlayer(announced) = &b_events[0] else {
            panic!("expected newPlayer, got {:?}", b_events[0]);
        };
        assert_eq!(announced.id, a);

        // The fresh record went to the store as well.
        match store_rx.try_recv() {
            Ok(StoreCommand::Save(saved)) => assert_eq!(saved.id, a),
            other => panic!("expected a save, got {:?}", other),
        }
    }

    #[test]
    fn test_join_without_lobby_reaches_nobody() {
        let (mut state, _store_rx) = test_state();
        let (a, mut a_rx) = connect(&mut state);
        let (_b, mut b_rx) = connect(&mut state);
        drain(&mut a_rx);
        drain(&mut b_rx);

        state.handle_event(a, ClientEvent::JoinGame { name: "A".to_string() }, None);

        // The joiner still gets its snapshot, outsiders hear nothing.
        assert_eq!(drain(&mut a_rx).len(), 1);
        assert!(drain(&mut b_rx).is_empty());
    }

    #[test]
    fn test_duplicate_join_is_silent() {
        let (mut state, _store_rx) = test_state();
        let (a, mut a_rx) = connect(&mut state);
        drain(&mut a_rx);

        state.handle_event(a, ClientEvent::JoinGame { name: "A".to_string() }, None);
        drain(&mut a_rx);
        state.handle_event(a, ClientEvent::JoinGame { name: "again".to_string() }, None);

        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(state.registry.get(a).unwrap().name, "A");
    }

    #[test]
    fn test_invalid_name_join_is_silent() {
        let (mut state, mut store_rx) = test_state();
        let (a, mut a_rx) = connect(&mut state);
        drain(&mut a_rx);

        state.handle_event(a, ClientEvent::JoinGame { name: "   ".to_string() }, None);

        assert!(drain(&mut a_rx).is_empty());
        assert!(store_rx.try_recv().is_err());
        assert!(state.registry.get(a).is_none());

        // The connection can retry with a usable name.
        state.handle_event(a, ClientEvent::JoinGame { name: "A".to_string() }, None);
        assert_eq!(drain(&mut a_rx).len(), 1);
    }

    #[test]
    fn test_move_broadcasts_lobby_snapshot() {
        let (mut state, mut store_rx) = test_state();
        let ((a, mut a_rx), (b, mut b_rx)) = lobby_pair(&mut state);
        while store_rx.try_recv().is_ok() {}

        state.handle_event(a, ClientEvent::Move { dx: 10.0, dy: -5.0 }, None);

        for rx in [&mut a_rx, &mut b_rx] {
            let events = drain(rx);
            assert_eq!(events.len(), 1);
            let ServerEvent::UpdatePlayers(snapshot) = &events[0] else {
                panic!("expected updatePlayers, got {:?}", events[0]);
            };
            assert_eq!(snapshot.len(), 2);
            assert_eq!(snapshot[&a].x, 110.0);
            assert_eq!(snapshot[&a].y, 95.0);
            assert_eq!(snapshot[&b].x, 500.0);
        }

        // The mover's new position is queued for persistence.
        match store_rx.try_recv() {
            Ok(StoreCommand::Save(saved)) => {
                assert_eq!(saved.id, a);
                assert_eq!(saved.x, 110.0);
            }
            other => panic!("expected a save, got {:?}", other),
        }
    }

    #[test]
    fn test_noop_move_stays_quiet() {
        let (mut state, mut store_rx) = test_state();
        let ((a, mut a_rx), (_b, mut b_rx)) = lobby_pair(&mut state);
        while store_rx.try_recv().is_ok() {}

        state.handle_event(a, ClientEvent::Move { dx: 0.0, dy: 0.0 }, None);

        assert!(drain(&mut a_rx).is_empty());
        assert!(drain(&mut b_rx).is_empty());
        assert!(store_rx.try_recv().is_err());
    }

    #[test]
    fn test_move_before_join_is_ignored() {
        let (mut state, _store_rx) = test_state();
        let (a, mut a_rx) = connect(&mut state);
        drain(&mut a_rx);
        state.handle_event(a, ClientEvent::Move { dx: 5.0, dy: 5.0 }, None);
        assert!(drain(&mut a_rx).is_empty());
    }

    #[test]
    fn test_hit_notifies_attacker_and_target() {
        let (mut state, mut store_rx) = test_state();
        let ((a, mut a_rx), (b, mut b_rx)) = lobby_pair(&mut state);
        while store_rx.try_recv().is_ok() {}

        state.handle_event(b, ClientEvent::PlayerHit(b, a), None);

        for rx in [&mut a_rx, &mut b_rx] {
            let events = drain(rx);
            assert_eq!(events, vec![ServerEvent::PlayerHit { id: a, health: 9 }]);
        }
        assert_eq!(state.registry.get(a).unwrap().health, 9);
        match store_rx.try_recv() {
            Ok(StoreCommand::Save(saved)) => assert_eq!(saved.health, 9),
            other => panic!("expected a save, got {:?}", other),
        }

        // Immediately repeated hit falls inside the cooldown window.
        state.handle_event(b, ClientEvent::PlayerHit(b, a), None);
        assert!(drain(&mut a_rx).is_empty());
        assert!(drain(&mut b_rx).is_empty());
        assert_eq!(state.registry.get(a).unwrap().health, 9);
    }

    #[test]
    fn test_death_emitted_exactly_once() {
        let config = Config {
            game: GameConfig { hit_cooldown_ms: 0, ..Default::default() },
            ..Default::default()
        };
        let (mut state, _store_rx) = test_state_with(config);
        let (a, mut a_rx) = connect(&mut state);
        let (b, mut b_rx) = connect(&mut state);
        state.handle_event(a, ClientEvent::CreateLobby("dusk".to_string()), None);
        state.handle_event(a, ClientEvent::JoinLobby("dusk".to_string()), None);
        state.handle_event(b, ClientEvent::JoinLobby("dusk".to_string()), None);
        let wounded = PlayerRecord { health: 2, ..record_at(a, 100.0, 100.0) };
        state.handle_event(a, ClientEvent::JoinGame { name: "A".to_string() }, Some(wounded));
        state.handle_event(b, ClientEvent::JoinGame { name: "B".to_string() }, None);
        drain(&mut a_rx);
        drain(&mut b_rx);

        // First hit wounds; only the second one kills.
        state.handle_event(b, ClientEvent::PlayerHit(b, a), None);
        let deaths = |events: &[ServerEvent]| {
            events
                .iter()
                .filter(|event| matches!(event, ServerEvent::PlayerDied(_)))
                .count()
        };
        assert_eq!(deaths(&drain(&mut a_rx)), 0);
        assert_eq!(deaths(&drain(&mut b_rx)), 0);

        state.handle_event(b, ClientEvent::PlayerHit(b, a), None);
        let a_events = drain(&mut a_rx);
        let b_events = drain(&mut b_rx);
        assert_eq!(deaths(&a_events), 1);
        assert_eq!(deaths(&b_events), 1);
        assert!(a_events.contains(&ServerEvent::PlayerHit { id: a, health: 0 }));

        // The dead record stays; further hits are dropped without events.
        state.handle_event(b, ClientEvent::PlayerHit(b, a), None);
        assert!(drain(&mut a_rx).is_empty());
        assert!(drain(&mut b_rx).is_empty());
        assert_eq!(state.registry.get(a).unwrap().health, 0);
    }

    #[test]
    fn test_self_hit_notifies_once() {
        let (mut state, _store_rx) = test_state();
        let ((a, mut a_rx), (_b, mut b_rx)) = lobby_pair(&mut state);

        state.handle_event(a, ClientEvent::PlayerHit(a, a), None);

        let events = drain(&mut a_rx);
        assert_eq!(events, vec![ServerEvent::PlayerHit { id: a, health: 9 }]);
        assert!(drain(&mut b_rx).is_empty());
    }

    #[test]
    fn test_hit_before_join_is_ignored() {
        let (mut state, _store_rx) = test_state();
        let (a, mut a_rx) = connect(&mut state);
        let (b, mut b_rx) = connect(&mut state);
        state.handle_event(a, ClientEvent::JoinGame { name: "A".to_string() }, None);
        drain(&mut a_rx);
        drain(&mut b_rx);

        // B never joined the game, so its hits carry no weight.
        state.handle_event(b, ClientEvent::PlayerHit(b, a), None);
        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(state.registry.get(a).unwrap().health, 10);
    }

    #[test]
    fn test_disconnect_cleans_up_everything() {
        let (mut state, mut store_rx) = test_state();
        let ((a, _a_rx), (_b, mut b_rx)) = lobby_pair(&mut state);
        while store_rx.try_recv().is_ok() {}

        state.handle_disconnect(a);

        assert_eq!(drain(&mut b_rx), vec![ServerEvent::PlayerDisconnected(a)]);
        assert!(state.registry.get(a).is_none());
        assert!(state.lobbies.find_by_member(a).is_none());
        assert!(matches!(store_rx.try_recv(), Ok(StoreCommand::Delete(id)) if id == a));

        // Terminal: nothing further is processed for the id.
        state.handle_event(a, ClientEvent::Move { dx: 1.0, dy: 1.0 }, None);
        assert!(drain(&mut b_rx).is_empty());
        state.handle_disconnect(a);
        assert!(store_rx.try_recv().is_err());
    }

    #[test]
    fn test_rejoining_lobby_moves_membership() {
        let (mut state, _store_rx) = test_state();
        let (a, mut a_rx) = connect(&mut state);
        drain(&mut a_rx);

        state.handle_event(a, ClientEvent::CreateLobby("dusk".to_string()), None);
        state.handle_event(a, ClientEvent::CreateLobby("dawn".to_string()), None);
        state.handle_event(a, ClientEvent::JoinLobby("dusk".to_string()), None);
        state.handle_event(a, ClientEvent::JoinLobby("dawn".to_string()), None);

        assert_eq!(state.lobbies.find_by_member(a).unwrap().name, "dawn");
        assert!(state.lobbies.get("dusk").unwrap().members.is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_loop_pushes_snapshots() {
        let (store, _store_rx) = StoreHandle::new();
        let state = Arc::new(RwLock::new(GameState::new(Config::default(), store)));

        let (a, mut a_rx) = {
            let mut state = state.write().await;
            let (tx, rx) = mpsc::unbounded_channel();
            let id = state.add_session(test_addr(), tx).unwrap();
            (id, rx)
        };
        {
            let mut state = state.write().await;
            state.handle_event(a, ClientEvent::CreateLobby("dusk".to_string()), None);
            state.handle_event(a, ClientEvent::JoinLobby("dusk".to_string()), None);
            state.handle_event(a, ClientEvent::JoinGame { name: "A".to_string() }, None);
        }
        drain(&mut a_rx);

        tokio::spawn(run_broadcast_loop(Arc::clone(&state), 10));
        sleep(Duration::from_millis(100)).await;

        let snapshots = drain(&mut a_rx)
            .into_iter()
            .filter(|event| matches!(event, ServerEvent::UpdatePlayers(_)))
            .count();
        assert!(snapshots >= 1, "expected at least one periodic snapshot");
    }
}
