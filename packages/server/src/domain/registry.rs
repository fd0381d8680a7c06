//! Connection Registry
//!
//! 論理ユーザーと、そのユーザーが同時に開いている接続（タブ・端末）の対応を管理する。
//! オンライン集合は保持せず、「接続を 1 つ以上持つユーザー」として導出する。

use std::collections::{BTreeSet, HashMap, HashSet};

use super::{ConnectionId, Timestamp, UserId};

/// 登録済みの接続
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    /// ゲスト接続は `None`
    pub user_id: Option<UserId>,
    pub connected_at: Timestamp,
}

/// `register` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registered {
    /// このユーザーの最初の接続だった
    pub became_online: bool,
}

/// `unregister` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unregistered {
    pub connection: Connection,
    /// 最後の接続が閉じてオフラインになったユーザー
    pub became_offline: Option<UserId>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 接続を登録する
    ///
    /// 同じ接続 ID の二重登録は何もしない（`became_online` は常に false）。
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        user_id: Option<UserId>,
        connected_at: Timestamp,
    ) -> Registered {
        if self.connections.contains_key(&connection_id) {
            return Registered {
                became_online: false,
            };
        }

        let mut became_online = false;
        if let Some(user_id) = &user_id {
            let sockets = self.by_user.entry(user_id.clone()).or_default();
            became_online = sockets.is_empty();
            sockets.insert(connection_id.clone());
        }

        self.connections.insert(
            connection_id.clone(),
            Connection {
                id: connection_id,
                user_id,
                connected_at,
            },
        );

        Registered { became_online }
    }

    /// 接続を削除する。未登録の接続なら `None`（冪等）。
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<Unregistered> {
        let connection = self.connections.remove(connection_id)?;

        let mut became_offline = None;
        if let Some(user_id) = &connection.user_id
            && let Some(sockets) = self.by_user.get_mut(user_id)
        {
            sockets.remove(connection_id);
            if sockets.is_empty() {
                self.by_user.remove(user_id);
                became_offline = Some(user_id.clone());
            }
        }

        Some(Unregistered {
            connection,
            became_offline,
        })
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    /// ユーザーの接続一覧（未知のユーザーなら空）
    pub fn connections_for_user(&self, user_id: &UserId) -> HashSet<ConnectionId> {
        self.by_user.get(user_id).cloned().unwrap_or_default()
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.by_user.contains_key(user_id)
    }

    /// オンラインのユーザー（昇順）
    pub fn online_users(&self) -> BTreeSet<UserId> {
        self.by_user.keys().cloned().collect()
    }

    /// ゲストを含む全ての接続 ID
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
