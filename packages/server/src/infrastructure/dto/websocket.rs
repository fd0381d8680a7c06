//! WebSocket frame DTOs.
//!
//! Every frame is a JSON text frame of the form `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ========================================
// Inbound (client -> server)
// ========================================

/// Event sent by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "channel:join")]
    ChannelJoin(String),
    #[serde(rename = "channel:leave")]
    ChannelLeave(String),
    #[serde(rename = "message:send")]
    MessageSend(MessageSendPayload),
    #[serde(rename = "message:update")]
    MessageUpdate(MessageUpdatePayload),
    #[serde(rename = "message:delete")]
    MessageDelete(MessageDeletePayload),
    #[serde(rename = "typing:start")]
    TypingStart(TypingPayload),
    #[serde(rename = "typing:stop")]
    TypingStop(TypingPayload),
    #[serde(rename = "voice:join")]
    VoiceJoin(VoiceJoinPayload),
    #[serde(rename = "voice:state-change")]
    VoiceStateChange(VoiceStateChangePayload),
    #[serde(rename = "voice:leave")]
    VoiceLeave(String),
}

/// `message:send` payload. Fields other than `channelId` are relayed untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSendPayload {
    pub channel_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageUpdatePayload {
    pub message_id: String,
    pub channel_id: String,
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDeletePayload {
    pub message_id: String,
    pub channel_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub channel_id: String,
    pub user_id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceUserPayload {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceJoinPayload {
    pub channel_id: String,
    pub user: VoiceUserPayload,
    #[serde(default)]
    pub is_muted: bool,
    #[serde(default)]
    pub is_camera_on: bool,
    #[serde(default)]
    pub is_deafened: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStateChangePayload {
    pub channel_id: String,
    pub is_muted: bool,
    pub is_camera_on: bool,
    pub is_deafened: bool,
}

// ========================================
// Outbound (server -> client)
// ========================================

/// Event pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "message:new")]
    MessageNew(Map<String, Value>),
    #[serde(rename = "message:update")]
    MessageUpdate(Map<String, Value>),
    #[serde(rename = "message:delete")]
    MessageDelete(Map<String, Value>),
    #[serde(rename = "typing:update")]
    TypingUpdate(TypingUpdateMessage),
    #[serde(rename = "voice:state-update")]
    VoiceStateUpdate(VoiceStateUpdateMessage),
    #[serde(rename = "presence:state")]
    PresenceState(PresenceStateMessage),
    #[serde(rename = "presence:update")]
    PresenceUpdate(PresenceUpdateMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypingUserInfo {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingUpdateMessage {
    pub channel_id: String,
    pub users: Vec<TypingUserInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceParticipantInfo {
    pub user_id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub connection_id: String,
    pub is_muted: bool,
    pub is_camera_on: bool,
    pub is_deafened: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceStateUpdateMessage {
    pub channel_id: String,
    pub users: Vec<VoiceParticipantInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceStateMessage {
    pub online_users: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceUpdateMessage {
    pub user_id: String,
    pub is_online: bool,
}
