//! Server configuration.

use serde::{Deserialize, Serialize};
use tracing::info;
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            game: GameConfig::default(),
            broadcast: BroadcastConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum concurrent connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}

/// World and combat rules.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Square world size; positions are clamped to `[0, world_size]` per axis.
    #[serde(default = "default_world_size")]
    pub world_size: f64,
    /// Collision radius given to newly spawned players.
    #[serde(default = "default_spawn_radius")]
    pub spawn_radius: f64,
    /// Health assigned at spawn.
    #[serde(default = "default_max_health")]
    pub max_health: u32,
    /// Minimum time between two damaging hits on the same target.
    #[serde(default = "default_hit_cooldown_ms")]
    pub hit_cooldown_ms: u64,
    /// Display names longer than this are truncated at join.
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_size: default_world_size(),
            spawn_radius: default_spawn_radius(),
            max_health: default_max_health(),
            hit_cooldown_ms: default_hit_cooldown_ms(),
            max_name_length: default_max_name_length(),
        }
    }
}

fn default_world_size() -> f64 {
    2000.0
}
fn default_spawn_radius() -> f64 {
    20.0
}
fn default_max_health() -> u32 {
    10
}
fn default_hit_cooldown_ms() -> u64 {
    1000
}
fn default_max_name_length() -> usize {
    30
}

/// Snapshot broadcast scheduling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BroadcastConfig {
    /// Interval between full-state snapshots, in milliseconds.
    #[serde(default = "default_broadcast_interval")]
    pub interval_ms: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_broadcast_interval(),
        }
    }
}

fn default_broadcast_interval() -> u64 {
    50
}

/// Player record persistence.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersistenceConfig {
    /// Backend: "memory" or "file".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Data directory for the file backend.
    #[serde(default = "default_data_path")]
    pub path: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_data_path(),
        }
    }
}

fn default_backend() -> String {
    "memory".to_string()
}
fn default_data_path() -> String {
    "player-data".to_string()
}
