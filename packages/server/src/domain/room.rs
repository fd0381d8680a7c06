//! Room Membership Tracker
//!
//! ルーム → 購読中の接続の対応。ルームは事前宣言されず、誰かが参加している間だけ存在する。

use std::collections::{HashMap, HashSet};

use super::{ConnectionId, RoomId};

#[derive(Debug, Default)]
pub struct RoomMembership {
    members: HashMap<RoomId, HashSet<ConnectionId>>,
    // leave_all 用の逆引き
    rooms_by_connection: HashMap<ConnectionId, HashSet<RoomId>>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームに参加する。既に参加済みなら false。
    pub fn join(&mut self, room_id: RoomId, connection_id: ConnectionId) -> bool {
        let inserted = self
            .members
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone());
        self.rooms_by_connection
            .entry(connection_id)
            .or_default()
            .insert(room_id);
        inserted
    }

    /// ルームから退出する。空になったルームは削除する。参加していなければ false。
    pub fn leave(&mut self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let removed = match self.members.get_mut(room_id) {
            Some(members) => {
                let removed = members.remove(connection_id);
                if members.is_empty() {
                    self.members.remove(room_id);
                }
                removed
            }
            None => false,
        };

        if let Some(rooms) = self.rooms_by_connection.get_mut(connection_id) {
            rooms.remove(room_id);
            if rooms.is_empty() {
                self.rooms_by_connection.remove(connection_id);
            }
        }

        removed
    }

    /// 接続を全てのルームから退出させ、退出したルームを返す（昇順）
    pub fn leave_all(&mut self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let Some(rooms) = self.rooms_by_connection.remove(connection_id) else {
            return Vec::new();
        };

        let mut vacated: Vec<RoomId> = rooms.into_iter().collect();
        vacated.sort();
        for room_id in &vacated {
            if let Some(members) = self.members.get_mut(room_id) {
                members.remove(connection_id);
                if members.is_empty() {
                    self.members.remove(room_id);
                }
            }
        }
        vacated
    }

    /// ルームの現在のメンバー（`except` を除く）
    pub fn members_except(
        &self,
        room_id: &RoomId,
        except: Option<&ConnectionId>,
    ) -> Vec<ConnectionId> {
        self.members
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|id| Some(*id) != except)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_member(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        self.members
            .get(room_id)
            .is_some_and(|members| members.contains(connection_id))
    }

    pub fn rooms_of(&self, connection_id: &ConnectionId) -> HashSet<RoomId> {
        self.rooms_by_connection
            .get(connection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn room_count(&self) -> usize {
        self.members.len()
    }
}
