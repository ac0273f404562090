//! Relay server implementation.

use crate::config::Config;
use crate::store::{JsonFileStore, MemoryStore, PlayerStore, StoreHandle, spawn_store_writer};
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientEvent, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

pub mod game;
pub mod session;

pub use game::{GameState, run_broadcast_loop};
pub use session::{Session, SessionState};

/// Run the relay server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on ws://{}", addr);

    // Persistence backend plus the writer task draining its queue.
    let store: Arc<dyn PlayerStore> = match config.persistence.backend.as_str() {
        "file" => Arc::new(JsonFileStore::open(config.persistence.path.clone())?),
        "memory" => Arc::new(MemoryStore::new()),
        other => {
            warn!("Unknown persistence backend {:?}, using memory", other);
            Arc::new(MemoryStore::new())
        }
    };
    let (store_handle, store_rx) = StoreHandle::new();
    spawn_store_writer(Arc::clone(&store), store_rx);

    // Shared game state
    let state = Arc::new(RwLock::new(GameState::new(config.clone(), store_handle)));

    // Start the snapshot broadcast loop
    let broadcast_state = Arc::clone(&state);
    let interval_ms = config.broadcast.interval_ms;
    tokio::spawn(async move {
        run_broadcast_loop(broadcast_state, interval_ms).await;
    });

    loop {
        let (stream, addr) = listener.accept().await?;

        let state = Arc::clone(&state);
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, state, store).await {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<RwLock<GameState>>,
    store: Arc<dyn PlayerStore>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut write, mut read) = ws_stream.split();

    // Register the session; everything queued on `rx` drains through this
    // task's writer half.
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let session_id = {
        let mut state = state.write().await;
        match state.add_session(addr, tx) {
            Some(id) => id,
            None => return Ok(()),
        }
    };

    loop {
        tokio::select! {
            // Inbound frames
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let event = match ClientEvent::decode(text.as_str()) {
                            Ok(event) => event,
                            Err(e) => {
                                warn!("Bad frame from {}: {}", addr, e);
                                continue;
                            }
                        };

                        // Joins read the store before the state lock is
                        // taken, so a slow load never stalls other
                        // connections.
                        let persisted = if matches!(event, ClientEvent::JoinGame { .. }) {
                            match store.load(session_id).await {
                                Ok(record) => record,
                                Err(e) => {
                                    warn!("Failed to load stored record for {}: {}", session_id, e);
                                    None
                                }
                            }
                        } else {
                            None
                        };

                        let mut state = state.write().await;
                        state.handle_event(session_id, event, persisted);
                    }
                    Some(Ok(Message::Close(_))) => {
                        debug!("Close frame from {}", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => {
                        break;
                    }
                    _ => {}
                }
            }
            // Outbound events queued by handlers and the broadcast loop
            event = rx.recv() => {
                let Some(event) = event else {
                    break;
                };
                let text = match event.encode() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode event for {}: {}", addr, e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(text.into())).await {
                    warn!("Failed to send to {}: {}", addr, e);
                    break;
                }
            }
        }
    }

    // Tear down: lobby membership, registry record, persisted record.
    {
        let mut state = state.write().await;
        state.handle_disconnect(session_id);
    }

    Ok(())
}
