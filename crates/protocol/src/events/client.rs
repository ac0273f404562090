//! Client -> Server events.

use crate::{PlayerId, ProtocolError};
use serde::{Deserialize, Serialize};

/// Decoded client event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Create a named lobby (idempotent).
    CreateLobby(String),
    /// Join an existing lobby by name.
    JoinLobby(String),
    /// Enter the game with a display name.
    JoinGame { name: String },
    /// Requested displacement for one input tick.
    Move { dx: f64, dy: f64 },
    /// Contact damage request; positional `[attackerId, targetId]`.
    PlayerHit(PlayerId, PlayerId),
}

impl ClientEvent {
    /// Decode one text frame.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Encode to a text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
