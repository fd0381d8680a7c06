//! Conversion logic between DTOs and domain types.

use serde_json::{Map, Value};

use crate::domain::{
    ChannelId, InboundEvent, MessageBody, Notification, TypingUser, UserId, ValueObjectError,
    VoiceFlags, VoiceParticipant, VoiceProfile, VoiceRoster,
};
use crate::infrastructure::dto::websocket as dto;

// ========================================
// DTO → Domain
// ========================================

fn with_routing_fields(mut extra: Map<String, Value>, fields: &[(&str, &str)]) -> MessageBody {
    for (key, value) in fields {
        extra.insert((*key).to_string(), Value::String((*value).to_string()));
    }
    extra
}

impl TryFrom<dto::ClientEvent> for InboundEvent {
    type Error = ValueObjectError;

    fn try_from(event: dto::ClientEvent) -> Result<Self, Self::Error> {
        let event = match event {
            dto::ClientEvent::ChannelJoin(channel_id) => {
                Self::ChannelJoin(ChannelId::new(channel_id)?)
            }
            dto::ClientEvent::ChannelLeave(channel_id) => {
                Self::ChannelLeave(ChannelId::new(channel_id)?)
            }
            dto::ClientEvent::MessageSend(payload) => {
                let channel_id = ChannelId::new(payload.channel_id)?;
                let body =
                    with_routing_fields(payload.extra, &[("channelId", channel_id.as_str())]);
                Self::MessageSend { channel_id, body }
            }
            dto::ClientEvent::MessageUpdate(payload) => {
                let channel_id = ChannelId::new(payload.channel_id)?;
                if payload.message_id.is_empty() {
                    return Err(ValueObjectError::Empty("message id"));
                }
                let body = with_routing_fields(
                    payload.extra,
                    &[
                        ("messageId", payload.message_id.as_str()),
                        ("channelId", channel_id.as_str()),
                        ("content", payload.content.as_str()),
                    ],
                );
                Self::MessageUpdate { channel_id, body }
            }
            dto::ClientEvent::MessageDelete(payload) => {
                let channel_id = ChannelId::new(payload.channel_id)?;
                if payload.message_id.is_empty() {
                    return Err(ValueObjectError::Empty("message id"));
                }
                let body = with_routing_fields(
                    payload.extra,
                    &[
                        ("messageId", payload.message_id.as_str()),
                        ("channelId", channel_id.as_str()),
                    ],
                );
                Self::MessageDelete { channel_id, body }
            }
            dto::ClientEvent::TypingStart(payload) => Self::TypingStart {
                channel_id: ChannelId::new(payload.channel_id)?,
                user_id: UserId::new(payload.user_id)?,
                display_name: payload.username,
            },
            dto::ClientEvent::TypingStop(payload) => Self::TypingStop {
                channel_id: ChannelId::new(payload.channel_id)?,
                user_id: UserId::new(payload.user_id)?,
            },
            dto::ClientEvent::VoiceJoin(payload) => Self::VoiceJoin {
                channel_id: ChannelId::new(payload.channel_id)?,
                profile: VoiceProfile {
                    user_id: UserId::new(payload.user.id)?,
                    display_name: payload.user.username,
                    avatar: payload.user.avatar,
                },
                flags: VoiceFlags {
                    muted: payload.is_muted,
                    camera_on: payload.is_camera_on,
                    deafened: payload.is_deafened,
                },
            },
            dto::ClientEvent::VoiceStateChange(payload) => Self::VoiceStateChange {
                channel_id: ChannelId::new(payload.channel_id)?,
                flags: VoiceFlags {
                    muted: payload.is_muted,
                    camera_on: payload.is_camera_on,
                    deafened: payload.is_deafened,
                },
            },
            dto::ClientEvent::VoiceLeave(channel_id) => {
                Self::VoiceLeave(ChannelId::new(channel_id)?)
            }
        };
        Ok(event)
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<&TypingUser> for dto::TypingUserInfo {
    fn from(user: &TypingUser) -> Self {
        Self {
            id: user.user_id.as_str().to_string(),
            username: user.display_name.clone(),
        }
    }
}

impl From<&VoiceParticipant> for dto::VoiceParticipantInfo {
    fn from(participant: &VoiceParticipant) -> Self {
        Self {
            user_id: participant.profile.user_id.as_str().to_string(),
            username: participant.profile.display_name.clone(),
            avatar: participant.profile.avatar.clone(),
            connection_id: participant.connection_id.as_str().to_string(),
            is_muted: participant.flags.muted,
            is_camera_on: participant.flags.camera_on,
            is_deafened: participant.flags.deafened,
        }
    }
}

impl From<&VoiceRoster> for dto::VoiceStateUpdateMessage {
    fn from(roster: &VoiceRoster) -> Self {
        Self {
            channel_id: roster.channel_id.as_str().to_string(),
            users: roster.participants.iter().map(Into::into).collect(),
        }
    }
}

impl From<&Notification> for dto::ServerEvent {
    fn from(notification: &Notification) -> Self {
        match notification {
            Notification::MessageNew(body) => Self::MessageNew(body.clone()),
            Notification::MessageUpdate(body) => Self::MessageUpdate(body.clone()),
            Notification::MessageDelete(body) => Self::MessageDelete(body.clone()),
            Notification::TypingUpdate { channel_id, users } => {
                Self::TypingUpdate(dto::TypingUpdateMessage {
                    channel_id: channel_id.as_str().to_string(),
                    users: users.iter().map(Into::into).collect(),
                })
            }
            Notification::VoiceStateUpdate(roster) => Self::VoiceStateUpdate(roster.into()),
            Notification::PresenceState { online_users } => {
                Self::PresenceState(dto::PresenceStateMessage {
                    online_users: online_users
                        .iter()
                        .map(|user_id| user_id.as_str().to_string())
                        .collect(),
                })
            }
            Notification::PresenceUpdate { user_id, is_online } => {
                Self::PresenceUpdate(dto::PresenceUpdateMessage {
                    user_id: user_id.as_str().to_string(),
                    is_online: *is_online,
                })
            }
        }
    }
}
