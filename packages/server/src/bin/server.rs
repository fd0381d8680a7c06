//! Tsudoi realtime server.
//!
//! Tracks presence, typing indicators and voice rosters, and relays chat
//! events between connections subscribed to the same channel.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsudoi-server
//! cargo run --bin tsudoi-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{collections::HashMap, sync::Arc};

use clap::Parser;
use tokio::sync::Mutex;
use tsudoi_server::{
    config::ServerConfig,
    domain::RealtimeState,
    infrastructure::message_pusher::WebSocketMessagePusher,
    ui::Server,
    usecase::{EventDispatcher, GetPresenceSnapshotUseCase, SweepExpiredTypingUseCase},
};
use tsudoi_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Initialize dependencies in order:
    // 1. State (in-memory trackers)
    // 2. MessagePusher
    // 3. UseCases
    // 4. Server

    // 1. Create the shared state
    let state = Arc::new(Mutex::new(RealtimeState::new(config.typing_ttl_ms)));
    tracing::info!(
        "Typing indicator TTL: {} ms",
        state.lock().await.typing.ttl_millis()
    );
    let clock = Arc::new(SystemClock);

    // 2. Create MessagePusher (WebSocket implementation)
    let message_pusher_connections = Arc::new(Mutex::new(HashMap::new()));
    let message_pusher = Arc::new(WebSocketMessagePusher::new(message_pusher_connections));

    // 3. Create UseCases
    let dispatcher = Arc::new(EventDispatcher::new(
        state.clone(),
        message_pusher.clone(),
        clock.clone(),
    ));
    let get_presence_snapshot_usecase =
        Arc::new(GetPresenceSnapshotUseCase::new(state.clone(), clock.clone()));
    let sweep_typing_usecase = Arc::new(SweepExpiredTypingUseCase::new(state, clock));

    // 4. Create and run the server
    let server = Server::new(
        dispatcher,
        get_presence_snapshot_usecase,
        sweep_typing_usecase,
    );
    if let Err(e) = server.run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
