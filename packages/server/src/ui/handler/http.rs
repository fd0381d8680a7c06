//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::PresenceSnapshotDto, ui::state::AppState,
    usecase::PresenceSnapshot,
};
use tsudoi_shared::time::timestamp_to_rfc3339;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current online users and voice rosters
pub async fn get_presence(State(state): State<Arc<AppState>>) -> Json<PresenceSnapshotDto> {
    let snapshot = state.get_presence_snapshot_usecase.execute().await;
    Json(to_dto(&snapshot))
}

// Domain Model から DTO への変換
fn to_dto(snapshot: &PresenceSnapshot) -> PresenceSnapshotDto {
    PresenceSnapshotDto {
        online_users: snapshot
            .online_users
            .iter()
            .map(|user_id| user_id.as_str().to_string())
            .collect(),
        voice_channels: snapshot.voice_rosters.iter().map(Into::into).collect(),
        connections: snapshot.connections,
        rooms: snapshot.rooms,
        generated_at: timestamp_to_rfc3339(snapshot.generated_at.value()),
    }
}
