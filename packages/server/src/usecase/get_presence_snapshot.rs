//! UseCase: 現在のプレゼンスとボイス名簿の取得
//!
//! `GET /api/presence` から使う読み取り専用のユースケース。

use std::sync::Arc;

use tsudoi_shared::time::Clock;

use crate::domain::{Timestamp, UserId, VoiceRoster};

use super::delivery::{SharedState, now};

/// ある時点のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceSnapshot {
    pub online_users: Vec<UserId>,
    pub voice_rosters: Vec<VoiceRoster>,
    pub connections: usize,
    pub rooms: usize,
    pub generated_at: Timestamp,
}

/// スナップショット取得のユースケース
pub struct GetPresenceSnapshotUseCase {
    state: SharedState,
    clock: Arc<dyn Clock>,
}

impl GetPresenceSnapshotUseCase {
    pub fn new(state: SharedState, clock: Arc<dyn Clock>) -> Self {
        Self { state, clock }
    }

    pub async fn execute(&self) -> PresenceSnapshot {
        let state = self.state.lock().await;
        PresenceSnapshot {
            online_users: state.registry.online_users().into_iter().collect(),
            voice_rosters: state.voice.rosters(),
            connections: state.registry.len(),
            rooms: state.rooms.room_count(),
            generated_at: now(self.clock.as_ref()),
        }
    }
}
