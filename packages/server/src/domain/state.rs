//! RealtimeState 集約
//!
//! 4 つのトラッカーを 1 つの所有者にまとめたもの。UseCase 層は単一のロック越しに
//! これを変更するため、複数ステップの変更（ボイスチャンネルの切り替えなど）の途中状態が
//! 他のハンドラから観測されることはない。

use super::{ConnectionRegistry, RoomMembership, TypingTracker, VoiceTracker};

#[derive(Debug, Default)]
pub struct RealtimeState {
    pub registry: ConnectionRegistry,
    pub rooms: RoomMembership,
    pub typing: TypingTracker,
    pub voice: VoiceTracker,
}

impl RealtimeState {
    pub fn new(typing_ttl_millis: i64) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomMembership::new(),
            typing: TypingTracker::new(typing_ttl_millis),
            voice: VoiceTracker::new(),
        }
    }
}
