//! Inbound events and outbound notifications in domain terms.
//!
//! Wire shapes live in `infrastructure::dto::websocket`; this module is what the
//! use cases see after validation.

use serde_json::{Map, Value};

use super::{ChannelId, TypingUser, UserId, VoiceFlags, VoiceProfile, VoiceRoster};

/// Message body relayed verbatim between clients.
///
/// The realtime layer never persists or inspects it beyond the routing fields.
pub type MessageBody = Map<String, Value>;

/// A validated event sent by a client.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    ChannelJoin(ChannelId),
    ChannelLeave(ChannelId),
    MessageSend {
        channel_id: ChannelId,
        body: MessageBody,
    },
    MessageUpdate {
        channel_id: ChannelId,
        body: MessageBody,
    },
    MessageDelete {
        channel_id: ChannelId,
        body: MessageBody,
    },
    TypingStart {
        channel_id: ChannelId,
        user_id: UserId,
        display_name: String,
    },
    TypingStop {
        channel_id: ChannelId,
        user_id: UserId,
    },
    VoiceJoin {
        channel_id: ChannelId,
        profile: VoiceProfile,
        flags: VoiceFlags,
    },
    VoiceStateChange {
        channel_id: ChannelId,
        flags: VoiceFlags,
    },
    VoiceLeave(ChannelId),
}

impl InboundEvent {
    /// Wire name, used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChannelJoin(_) => "channel:join",
            Self::ChannelLeave(_) => "channel:leave",
            Self::MessageSend { .. } => "message:send",
            Self::MessageUpdate { .. } => "message:update",
            Self::MessageDelete { .. } => "message:delete",
            Self::TypingStart { .. } => "typing:start",
            Self::TypingStop { .. } => "typing:stop",
            Self::VoiceJoin { .. } => "voice:join",
            Self::VoiceStateChange { .. } => "voice:state-change",
            Self::VoiceLeave(_) => "voice:leave",
        }
    }
}

/// A state change to deliver to one or more connections.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    MessageNew(MessageBody),
    MessageUpdate(MessageBody),
    MessageDelete(MessageBody),
    TypingUpdate {
        channel_id: ChannelId,
        users: Vec<TypingUser>,
    },
    VoiceStateUpdate(VoiceRoster),
    PresenceState {
        online_users: Vec<UserId>,
    },
    PresenceUpdate {
        user_id: UserId,
        is_online: bool,
    },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageNew(_) => "message:new",
            Self::MessageUpdate(_) => "message:update",
            Self::MessageDelete(_) => "message:delete",
            Self::TypingUpdate { .. } => "typing:update",
            Self::VoiceStateUpdate(_) => "voice:state-update",
            Self::PresenceState { .. } => "presence:state",
            Self::PresenceUpdate { .. } => "presence:update",
        }
    }
}
