//! Shared protocol crate for the Outbreak relay server.
//!
//! This crate contains:
//! - Wire event definitions (client -> server and server -> client)
//! - Shared record types (PlayerRecord, LobbyInfo, Color)
//! - The JSON event envelope the browser client speaks

mod error;
pub mod events;

pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Stable identity assigned to each realtime connection. Doubles as the
/// player key everywhere: registry, lobby membership, persisted records.
pub type PlayerId = u32;

/// Snapshot map keyed by connection id, as carried by `init` and
/// `updatePlayers`.
pub type PlayerMap = HashMap<PlayerId, PlayerRecord>;

/// RGB display color, carried on the wire as an uppercase `"#RRGGBB"` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6 && hex.is_ascii())
            .ok_or_else(|| ProtocolError::InvalidColor(s.to_string()))?;
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| ProtocolError::InvalidColor(s.to_string()))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Authoritative per-player state, one record per joined connection.
///
/// This exact document travels in `init`/`updatePlayers` snapshots and is
/// what the persistent store keeps per connection id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: Color,
    pub health: u32,
    /// Epoch milliseconds of the most recent damaging hit; 0 = never hit.
    pub last_hit_time: u64,
}

/// One lobby row in the `lobbies` overview: name plus current member ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobbyInfo {
    pub name: String,
    pub players: Vec<PlayerId>,
}
