//! Authoritative player state.

use crate::config::GameConfig;
use protocol::{Color, PlayerId, PlayerMap, PlayerRecord};
use rand::Rng;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Reasons a join is refused. Nothing is sent back for these; the server
/// only logs them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("Display name is empty")]
    InvalidName,

    #[error("Connection {0} already has a live player")]
    DuplicateJoin(PlayerId),
}

/// Reasons a hit is dropped without any state change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HitRejected {
    #[error("Unknown target {0}")]
    UnknownTarget(PlayerId),

    #[error("Target {0} is already dead")]
    TargetDead(PlayerId),

    #[error("Target {0} is still in hit cooldown")]
    Cooldown(PlayerId),
}

/// Outcome of a movement request.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// Record after clamping.
    pub record: PlayerRecord,
    /// Whether the clamped position differs from the previous one.
    pub moved: bool,
}

/// Outcome of an accepted hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitResult {
    /// Target health after the hit.
    pub health: u32,
    /// True exactly when this hit took the target to zero health.
    pub died: bool,
}

/// In-memory source of truth for player position, health and hit cooldowns.
///
/// One record per joined connection. Lobbies and sessions only hold ids into
/// this map; all mutation goes through the methods here so the bounds and
/// health invariants hold at every exit.
#[derive(Debug)]
pub struct GameStateRegistry {
    rules: GameConfig,
    players: HashMap<PlayerId, PlayerRecord>,
}

impl GameStateRegistry {
    pub fn new(rules: GameConfig) -> Self {
        Self {
            rules,
            players: HashMap::new(),
        }
    }

    /// Admit a player.
    ///
    /// `persisted` is the record previously saved for this connection id, if
    /// any; it wins over a fresh spawn so health and position survive a
    /// rejoin. Fresh spawns get a uniform random position and color.
    pub fn join(
        &mut self,
        id: PlayerId,
        name: &str,
        persisted: Option<PlayerRecord>,
    ) -> Result<PlayerRecord, JoinError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JoinError::InvalidName);
        }
        if self.players.contains_key(&id) {
            return Err(JoinError::DuplicateJoin(id));
        }

        let record = persisted.unwrap_or_else(|| {
            let mut rng = rand::rng();
            PlayerRecord {
                id,
                name: name.chars().take(self.rules.max_name_length).collect(),
                x: rng.random_range(0.0..self.rules.world_size),
                y: rng.random_range(0.0..self.rules.world_size),
                radius: self.rules.spawn_radius,
                color: random_color(&mut rng),
                health: self.rules.max_health,
                last_hit_time: 0,
            }
        });
        self.players.insert(id, record.clone());
        Ok(record)
    }

    /// Apply a movement delta, clamping each axis to the world bounds.
    ///
    /// Returns `None` for ids with no live record. Out-of-range deltas are
    /// clamped rather than rejected; `moved` is false when the clamped
    /// position is unchanged, so callers can skip broadcast and persistence.
    pub fn apply_move(&mut self, id: PlayerId, dx: f64, dy: f64) -> Option<MoveOutcome> {
        let size = self.rules.world_size;
        let player = self.players.get_mut(&id)?;
        let (prev_x, prev_y) = (player.x, player.y);
        player.x = (player.x + dx).clamp(0.0, size);
        player.y = (player.y + dy).clamp(0.0, size);
        let moved = player.x != prev_x || player.y != prev_y;
        Some(MoveOutcome {
            record: player.clone(),
            moved,
        })
    }

    /// Apply contact damage from `attacker` to `target` at `now_ms`.
    ///
    /// The target must be alive and out of cooldown; rejected hits change
    /// nothing. An accepted hit decrements health by one, stamps the
    /// cooldown clock, and reports the death transition when health reaches
    /// zero. Nothing stops attacker and target being the same player.
    pub fn apply_hit(
        &mut self,
        _attacker: PlayerId,
        target: PlayerId,
        now_ms: u64,
    ) -> Result<HitResult, HitRejected> {
        let cooldown = self.rules.hit_cooldown_ms;
        let player = self
            .players
            .get_mut(&target)
            .ok_or(HitRejected::UnknownTarget(target))?;
        if player.health == 0 {
            return Err(HitRejected::TargetDead(target));
        }
        if now_ms.saturating_sub(player.last_hit_time) < cooldown {
            return Err(HitRejected::Cooldown(target));
        }

        player.health -= 1;
        player.last_hit_time = now_ms;
        Ok(HitResult {
            health: player.health,
            died: player.health == 0,
        })
    }

    /// Remove a player's record, if any.
    pub fn remove(&mut self, id: PlayerId) -> Option<PlayerRecord> {
        self.players.remove(&id)
    }

    pub fn get(&self, id: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(&id)
    }

    /// Clone of the full registry, as sent in `init`.
    pub fn snapshot(&self) -> PlayerMap {
        self.players.clone()
    }

    /// Clone of the records for `ids` that are still live (lobby snapshots).
    pub fn snapshot_of<'a>(&self, ids: impl IntoIterator<Item = &'a PlayerId>) -> PlayerMap {
        ids.into_iter()
            .filter_map(|id| self.players.get(id).map(|record| (*id, record.clone())))
            .collect()
    }
}

/// Uniform random display color.
fn random_color(rng: &mut impl Rng) -> Color {
    Color::new(rng.random(), rng.random(), rng.random())
}

/// Current wall-clock time in epoch milliseconds, the clock the hit
/// cooldown runs on.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
