//! Outbreak relay server library.

pub mod config;
pub mod lobby;
pub mod registry;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use lobby::{Lobby, LobbyError, LobbyRegistry};
pub use registry::{GameStateRegistry, HitRejected, HitResult, JoinError, MoveOutcome};
pub use server::{GameState, Session, SessionState, run, run_broadcast_loop};
pub use store::{
    JsonFileStore, MemoryStore, PlayerStore, StoreCommand, StoreError, StoreHandle,
    spawn_store_writer,
};
