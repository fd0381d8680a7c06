//! 送信先の解決と配送
//!
//! ハンドラは「誰に何を送るか」を [`Outbound`] として返すだけで、実際の送信は
//! [`deliver`] が行う。送信先はロックを保持したまま現在のメンバーシップから解決するため、
//! 古いメンバー情報に基づいて送ることはない。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, MessagePusher, Notification, RealtimeState, RoomId, Timestamp, UserId,
};

/// 全てのトラッカーを保持する共有状態
pub type SharedState = Arc<Mutex<RealtimeState>>;

/// イベントを送ってきた接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    pub connection_id: ConnectionId,
    /// ゲスト接続は `None`
    pub user_id: Option<UserId>,
}

impl ConnectionContext {
    pub fn new(connection_id: ConnectionId, user_id: Option<UserId>) -> Self {
        Self {
            connection_id,
            user_id,
        }
    }
}

/// 送信先
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// 単一の接続
    Connection(ConnectionId),
    /// ゲストを含む全ての接続
    Everyone,
    /// ルームのメンバー（`except` を除く）
    Room {
        room_id: RoomId,
        except: Option<ConnectionId>,
    },
}

/// 送信予定の通知
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub audience: Audience,
    pub notification: Notification,
}

impl Outbound {
    pub fn to_connection(connection_id: ConnectionId, notification: Notification) -> Self {
        Self {
            audience: Audience::Connection(connection_id),
            notification,
        }
    }

    pub fn to_everyone(notification: Notification) -> Self {
        Self {
            audience: Audience::Everyone,
            notification,
        }
    }

    pub fn to_room(
        room_id: RoomId,
        except: Option<ConnectionId>,
        notification: Notification,
    ) -> Self {
        Self {
            audience: Audience::Room { room_id, except },
            notification,
        }
    }
}

/// 現在の状態に基づいて送信先の接続を解決する
pub fn resolve(state: &RealtimeState, audience: &Audience) -> Vec<ConnectionId> {
    match audience {
        Audience::Connection(connection_id) => vec![connection_id.clone()],
        Audience::Everyone => state.registry.connection_ids(),
        Audience::Room { room_id, except } => state.rooms.members_except(room_id, except.as_ref()),
    }
}

/// 通知を順番に配送する（ファイア・アンド・フォーゲット）
pub async fn deliver(state: &RealtimeState, pusher: &dyn MessagePusher, outbound: Vec<Outbound>) {
    for Outbound {
        audience,
        notification,
    } in outbound
    {
        match &audience {
            Audience::Connection(connection_id) => {
                if let Err(e) = pusher.push_to(connection_id, &notification).await {
                    tracing::warn!(
                        "Failed to push '{}' to '{}': {}",
                        notification.name(),
                        connection_id,
                        e
                    );
                }
            }
            _ => {
                let targets = resolve(state, &audience);
                pusher.broadcast(targets, &notification).await;
            }
        }
    }
}

/// 時計の現在時刻を Timestamp にする
pub fn now(clock: &dyn tsudoi_shared::time::Clock) -> Timestamp {
    Timestamp::new(clock.now_millis())
}
