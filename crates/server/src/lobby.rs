//! Lobby bookkeeping: named rooms of connection ids sharing a broadcast scope.

use protocol::{LobbyInfo, PlayerId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Lobby operation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("No lobby named {0:?}")]
    NotFound(String),
}

/// One named lobby. Holds member ids only, never player data.
#[derive(Debug)]
pub struct Lobby {
    pub name: String,
    pub members: HashSet<PlayerId>,
}

/// Registry of lobbies.
///
/// A connection belongs to at most one lobby; joining another moves it.
/// Lobbies are never destroyed: an emptied lobby stays listed and joinable.
#[derive(Debug, Default)]
pub struct LobbyRegistry {
    lobbies: HashMap<String, Lobby>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self {
            lobbies: HashMap::new(),
        }
    }

    /// Create a lobby. Returns false when the name is already taken
    /// (creation is idempotent).
    pub fn create(&mut self, name: &str) -> bool {
        if self.lobbies.contains_key(name) {
            return false;
        }
        self.lobbies.insert(
            name.to_string(),
            Lobby {
                name: name.to_string(),
                members: HashSet::new(),
            },
        );
        true
    }

    /// Add a connection to a lobby, moving it out of any previous one.
    pub fn join(&mut self, id: PlayerId, name: &str) -> Result<(), LobbyError> {
        if !self.lobbies.contains_key(name) {
            return Err(LobbyError::NotFound(name.to_string()));
        }
        if self.lobbies.get(name).is_some_and(|lobby| lobby.members.contains(&id)) {
            return Ok(());
        }
        self.remove_member(id);
        if let Some(lobby) = self.lobbies.get_mut(name) {
            lobby.members.insert(id);
        }
        Ok(())
    }

    /// Linear scan for the lobby containing `id`; lobby counts stay small.
    pub fn find_by_member(&self, id: PlayerId) -> Option<&Lobby> {
        self.lobbies.values().find(|lobby| lobby.members.contains(&id))
    }

    /// Drop `id` from whichever lobby holds it, returning that lobby's name.
    pub fn remove_member(&mut self, id: PlayerId) -> Option<String> {
        let lobby = self
            .lobbies
            .values_mut()
            .find(|lobby| lobby.members.contains(&id))?;
        lobby.members.remove(&id);
        Some(lobby.name.clone())
    }

    pub fn get(&self, name: &str) -> Option<&Lobby> {
        self.lobbies.get(name)
    }

    /// All lobbies, for the periodic snapshot fan-out.
    pub fn iter(&self) -> impl Iterator<Item = &Lobby> {
        self.lobbies.values()
    }

    /// Rows for the `lobbies` event.
    pub fn overview(&self) -> Vec<LobbyInfo> {
        self.lobbies
            .values()
            .map(|lobby| LobbyInfo {
                name: lobby.name.clone(),
                players: lobby.members.iter().copied().collect(),
            })
            .collect()
    }
}
