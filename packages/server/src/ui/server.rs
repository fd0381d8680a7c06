//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{Router, http::HeaderValue, routing::get};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::ServerConfig,
    usecase::{EventDispatcher, GetPresenceSnapshotUseCase, SweepExpiredTypingUseCase},
};

use super::{
    handler::{get_presence, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Realtime presence server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(dispatcher, get_presence_snapshot_usecase, sweep_typing_usecase);
/// server.run(ServerConfig::default()).await?;
/// ```
pub struct Server {
    /// EventDispatcher（接続のライフサイクルと受信イベントの処理）
    dispatcher: Arc<EventDispatcher>,
    /// GetPresenceSnapshotUseCase（プレゼンスのスナップショット取得）
    get_presence_snapshot_usecase: Arc<GetPresenceSnapshotUseCase>,
    /// SweepExpiredTypingUseCase（期限切れの入力中エントリの掃除）
    sweep_typing_usecase: Arc<SweepExpiredTypingUseCase>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        dispatcher: Arc<EventDispatcher>,
        get_presence_snapshot_usecase: Arc<GetPresenceSnapshotUseCase>,
        sweep_typing_usecase: Arc<SweepExpiredTypingUseCase>,
    ) -> Self {
        Self {
            dispatcher,
            get_presence_snapshot_usecase,
            sweep_typing_usecase,
        }
    }

    /// Build the router with the WebSocket and HTTP endpoints
    pub fn router(&self, config: &ServerConfig) -> Router {
        let app_state = Arc::new(AppState {
            dispatcher: self.dispatcher.clone(),
            get_presence_snapshot_usecase: self.get_presence_snapshot_usecase.clone(),
        });

        Router::new()
            // WebSocket エンドポイント
            .route(&config.ws_path, get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/presence", get(get_presence))
            .layer(cors_layer(&config.cors_origin))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Bind to the configured address and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Tsudoi realtime server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}{}", bind_addr, config.ws_path);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, config, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(
        self,
        listener: TcpListener,
        config: ServerConfig,
        shutdown: F,
    ) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router(&config);
        let sweeper = spawn_typing_sweeper(self.sweep_typing_usecase, config.typing_sweep_ms);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        result
    }
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Invalid CORS origin '{}': {}. Cross-origin requests disabled", origin, e);
            layer
        }
    }
}

/// 期限切れの入力中エントリを定期的に削除するタスク（0 なら起動しない）
fn spawn_typing_sweeper(
    usecase: Arc<SweepExpiredTypingUseCase>,
    interval_millis: u64,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval_millis == 0 {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_millis));
        // 最初の tick は即座に完了する
        interval.tick().await;
        loop {
            interval.tick().await;
            usecase.execute().await;
        }
    }))
}
