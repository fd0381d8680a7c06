//! Realtime server UI layer: HTTP routing and WebSocket sessions.

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
pub use signal::shutdown_signal;
