//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::VoiceStateUpdateMessage;

/// `GET /api/presence` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSnapshotDto {
    pub online_users: Vec<String>,
    pub voice_channels: Vec<VoiceStateUpdateMessage>,
    pub connections: usize,
    pub rooms: usize,
    pub generated_at: String,
}
