//! Connection session state.

use protocol::{PlayerId, ServerEvent};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::debug;

/// Protocol stage of one connection.
///
/// A session starts in `Connected` and becomes `Active` on a successful
/// game join; removal from the session table is the terminal disconnect,
/// after which no events are processed for the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Websocket established; lobby traffic only, not yet in the game.
    Connected,
    /// Joined the game; movement and combat events are accepted.
    Active,
}

/// A connected client session.
#[derive(Debug)]
pub struct Session {
    /// Unique connection id.
    pub id: PlayerId,
    /// Remote address.
    pub addr: SocketAddr,
    /// Protocol stage.
    pub state: SessionState,
    /// Outbox drained by the connection's writer half.
    tx: mpsc::UnboundedSender<ServerEvent>,
}

impl Session {
    /// Create a new session in the `Connected` stage.
    pub fn new(id: PlayerId, addr: SocketAddr, tx: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id,
            addr,
            state: SessionState::Connected,
            tx,
        }
    }

    /// Whether the session has joined the game.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Queue an event for this connection. A closed outbox just means the
    /// connection is tearing down, so the failure is logged and swallowed.
    pub fn send(&self, event: ServerEvent) {
        if self.tx.send(event).is_err() {
            debug!("Session {} outbox closed; dropping event", self.id);
        }
    }
}
