//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{
    Stream,
    sink::SinkExt,
    stream::StreamExt,
};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};

use crate::{
    domain::{ConnectionId, InboundEvent, UserId},
    infrastructure::dto::websocket::ClientEvent,
    ui::state::AppState,
    usecase::{ConnectError, ConnectionContext},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    /// 認証済みユーザー ID。無い場合はゲスト接続
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> UserId (Domain Model)
    let user_id = match query.user_id.filter(|id| !id.is_empty()) {
        Some(raw) => match UserId::try_from(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Invalid userId: {}", e);
                return Err(StatusCode::BAD_REQUEST);
            }
        },
        None => None,
    };

    let ctx = ConnectionContext::new(ConnectionId::generate(), user_id);

    // Create a channel for this connection to receive frames
    let (tx, rx) = mpsc::unbounded_channel();

    match state.dispatcher.open(&ctx, tx).await {
        Ok(_connected_at) => {
            let failed_state = state.clone();
            let failed_ctx = ctx.clone();
            Ok(ws
                .on_failed_upgrade(move |e| {
                    tracing::warn!(
                        "WebSocket upgrade failed for '{}': {}",
                        failed_ctx.connection_id,
                        e
                    );
                    tokio::spawn(async move {
                        failed_state.dispatcher.close(&failed_ctx).await;
                    });
                })
                .on_upgrade(move |socket| handle_socket(socket, state, ctx, rx)))
        }
        Err(ConnectError::DuplicateConnection(id)) => {
            tracing::warn!("Connection '{}' is already registered. Rejecting.", id);
            Err(StatusCode::CONFLICT)
        }
    }
}

/// Spawns a task that forwards encoded frames from the rx channel to the WebSocket.
///
/// Frames queued before the upgrade completes (the initial presence snapshot)
/// are flushed first.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

/// Parses a text frame into a domain event. Malformed frames yield `None`.
fn parse_frame(connection_id: &ConnectionId, text: &str) -> Option<InboundEvent> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Dropping malformed frame from '{}': {}", connection_id, e);
            return None;
        }
    };
    match InboundEvent::try_from(event) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!("Dropping invalid event from '{}': {}", connection_id, e);
            None
        }
    }
}

/// Receives frames and dispatches them until the stream ends or `stop` fires.
///
/// `stop` is only observed between frames, so an event that has been read is
/// always dispatched and delivered to completion.
async fn recv_loop<S, E>(
    mut receiver: S,
    mut stop: oneshot::Receiver<()>,
    state: Arc<AppState>,
    ctx: ConnectionContext,
) where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    loop {
        let msg = tokio::select! {
            biased;
            msg = receiver.next() => msg,
            _ = &mut stop => break,
        };
        let msg = match msg {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => {
                tracing::warn!("WebSocket error on '{}': {}", ctx.connection_id, e);
                break;
            }
            None => break,
        };

        match msg {
            Message::Text(text) => {
                if let Some(event) = parse_frame(&ctx.connection_id, &text) {
                    state.dispatcher.dispatch(&ctx, event).await;
                }
            }
            Message::Close(_) => {
                tracing::debug!("Connection '{}' requested close", ctx.connection_id);
                break;
            }
            // Ping/pong is handled automatically by the WebSocket protocol
            _ => {}
        }
    }
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    ctx: ConnectionContext,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, receiver) = socket.split();
    let (stop_tx, stop_rx) = oneshot::channel();

    // Spawn a task to receive events from this connection
    let mut recv_task = tokio::spawn(recv_loop(receiver, stop_rx, state.clone(), ctx.clone()));

    // Spawn a task to forward notifications to this connection
    let mut send_task = pusher_loop(rx, sender);

    let recv_finished = tokio::select! {
        _ = &mut recv_task => true,
        _ = &mut send_task => false,
    };
    if recv_finished {
        send_task.abort();
    } else {
        // 読み込み済みのイベントは配送まで完了させる
        let _ = stop_tx.send(());
        if let Err(e) = recv_task.await {
            tracing::warn!("Receive task for '{}' failed: {}", ctx.connection_id, e);
        }
    }

    if state.dispatcher.close(&ctx).await.is_none() {
        tracing::warn!(
            "Connection '{}' was already removed before close",
            ctx.connection_id
        );
    }
}
