//! Server -> Client events.

use crate::{LobbyInfo, PlayerId, PlayerMap, PlayerRecord, ProtocolError};
use serde::{Deserialize, Serialize};

/// Outbound server event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Current lobby overview; pushed on connect and after lobby creation.
    Lobbies(Vec<LobbyInfo>),
    /// Full snapshot sent once to a joining connection.
    Init { players: PlayerMap },
    /// Announces a newly joined player to the rest of its lobby.
    NewPlayer(PlayerRecord),
    /// Periodic or move-triggered snapshot of one broadcast scope.
    UpdatePlayers(PlayerMap),
    /// Result of an accepted hit, sent to attacker and target.
    PlayerHit { id: PlayerId, health: u32 },
    /// Death notification for the one-to-zero health transition.
    PlayerDied(PlayerId),
    /// Membership removal notification for a lobby scope.
    PlayerDisconnected(PlayerId),
}

impl ServerEvent {
    /// Decode one text frame.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode to a text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
