//! Shared application state.

use std::sync::Arc;

use crate::usecase::{EventDispatcher, GetPresenceSnapshotUseCase};

/// Shared application state
pub struct AppState {
    /// EventDispatcher（接続のライフサイクルと受信イベントの処理）
    pub dispatcher: Arc<EventDispatcher>,
    /// GetPresenceSnapshotUseCase（プレゼンスのスナップショット取得）
    pub get_presence_snapshot_usecase: Arc<GetPresenceSnapshotUseCase>,
}
