//! Server configuration (command-line flags with environment fallbacks).

use clap::Parser;

use crate::domain::DEFAULT_TYPING_TTL_MILLIS;

#[derive(Parser, Debug, Clone)]
#[command(name = "tsudoi-server")]
#[command(about = "Realtime presence, typing and voice-roster server", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TSUDOI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Path of the WebSocket endpoint
    #[arg(long, env = "TSUDOI_WS_PATH", default_value = "/api/socket", value_parser = parse_route_path)]
    pub ws_path: String,

    /// How long a typing indicator stays visible without a refresh (clamped to 2000..=5000)
    #[arg(long, env = "TSUDOI_TYPING_TTL_MS", default_value_t = DEFAULT_TYPING_TTL_MILLIS)]
    pub typing_ttl_ms: i64,

    /// Interval of the expired typing entry sweep, 0 disables it
    #[arg(long, env = "TSUDOI_TYPING_SWEEP_MS", default_value_t = 10_000)]
    pub typing_sweep_ms: u64,

    /// Allowed CORS origin (`*` allows any)
    #[arg(long, env = "TSUDOI_CORS_ORIGIN", default_value = "http://localhost:3000")]
    pub cors_origin: String,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ws_path: "/api/socket".to_string(),
            typing_ttl_ms: DEFAULT_TYPING_TTL_MILLIS,
            typing_sweep_ms: 10_000,
            cors_origin: "http://localhost:3000".to_string(),
            log_level: "debug".to_string(),
        }
    }
}

fn parse_route_path(value: &str) -> Result<String, String> {
    if value.starts_with('/') && value.len() > 1 {
        Ok(value.to_string())
    } else {
        Err(format!("route path must start with '/': '{}'", value))
    }
}
