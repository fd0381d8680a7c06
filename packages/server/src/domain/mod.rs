//! Domain layer: value objects, the in-memory trackers and the ports they need.

pub mod error;
pub mod event;
pub mod pusher;
pub mod registry;
pub mod room;
pub mod state;
pub mod typing;
pub mod value_object;
pub mod voice;

pub use error::{MessagePushError, ValueObjectError};
pub use event::{InboundEvent, MessageBody, Notification};
pub use pusher::{MessagePusher, PusherChannel};
pub use registry::{Connection, ConnectionRegistry, Registered, Unregistered};
pub use room::RoomMembership;
pub use state::RealtimeState;
pub use typing::{
    DEFAULT_TYPING_TTL_MILLIS, MAX_TYPING_TTL_MILLIS, MIN_TYPING_TTL_MILLIS, TypingTracker,
    TypingUser,
};
pub use value_object::{ChannelId, ConnectionId, RoomId, Timestamp, UserId};
pub use voice::{VoiceFlags, VoiceJoin, VoiceParticipant, VoiceProfile, VoiceRoster, VoiceTracker};

#[cfg(test)]
pub use pusher::MockMessagePusher;
