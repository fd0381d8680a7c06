//! Voice Presence Tracker
//!
//! ボイスチャンネルごとの参加者名簿。1 つの接続は同時に高々 1 つのボイスチャンネルにしか
//! 存在できない。変更のたびに影響を受けたチャンネルの名簿全体（差分ではない）を返す。
//!
//! 接続ごとの状態遷移:
//!
//! ```text
//! NotInVoice --join(A)--> InVoice(A) --join(B)--> InVoice(B)
//!      ^                      |
//!      +---- leave(A) / disconnect
//! ```

use std::collections::HashMap;

use super::{ChannelId, ConnectionId, UserId};

/// マイク・カメラ・スピーカーの状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoiceFlags {
    pub muted: bool,
    pub camera_on: bool,
    pub deafened: bool,
}

/// 名簿に表示するユーザー情報（クライアント申告値）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    pub user_id: UserId,
    pub display_name: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceParticipant {
    pub connection_id: ConnectionId,
    pub profile: VoiceProfile,
    pub flags: VoiceFlags,
}

/// 名簿のスナップショット
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceRoster {
    pub channel_id: ChannelId,
    pub participants: Vec<VoiceParticipant>,
}

/// `join` の結果
///
/// `left` は切り替え前のチャンネルの名簿（同じチャンネルへの再参加なら `None`）。
/// `left` と `joined` は 1 回の操作で確定した状態なので、途中状態は観測されない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceJoin {
    pub left: Option<VoiceRoster>,
    pub joined: VoiceRoster,
}

#[derive(Debug, Default)]
pub struct VoiceTracker {
    // 名簿は参加順。人数は少ないので線形探索で十分
    channels: HashMap<ChannelId, Vec<VoiceParticipant>>,
    location: HashMap<ConnectionId, ChannelId>,
}

impl VoiceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// ボイスチャンネルに参加する
    ///
    /// 他のチャンネルにいる場合は先にそこから抜ける。同じチャンネルへの再参加は
    /// 名簿上の位置を保ったままプロフィールとフラグを更新する。
    pub fn join(
        &mut self,
        channel_id: ChannelId,
        connection_id: ConnectionId,
        profile: VoiceProfile,
        flags: VoiceFlags,
    ) -> VoiceJoin {
        let left = match self.location.get(&connection_id) {
            Some(current) if *current != channel_id => {
                let current = current.clone();
                self.remove(&current, &connection_id)
            }
            _ => None,
        };

        let roster = self.channels.entry(channel_id.clone()).or_default();
        match roster
            .iter_mut()
            .find(|participant| participant.connection_id == connection_id)
        {
            Some(existing) => {
                existing.profile = profile;
                existing.flags = flags;
            }
            None => roster.push(VoiceParticipant {
                connection_id: connection_id.clone(),
                profile,
                flags,
            }),
        }
        self.location.insert(connection_id, channel_id.clone());

        VoiceJoin {
            left,
            joined: self.roster(&channel_id),
        }
    }

    /// ボイスチャンネルから抜ける。参加していなければ `None`。
    pub fn leave(
        &mut self,
        channel_id: &ChannelId,
        connection_id: &ConnectionId,
    ) -> Option<VoiceRoster> {
        if self.location.get(connection_id) != Some(channel_id) {
            return None;
        }
        self.remove(channel_id, connection_id)
    }

    /// フラグを更新する。そのチャンネルの参加者でなければ `None`（遅れて届いた UI イベント）。
    pub fn update_flags(
        &mut self,
        channel_id: &ChannelId,
        connection_id: &ConnectionId,
        flags: VoiceFlags,
    ) -> Option<VoiceRoster> {
        let participant = self
            .channels
            .get_mut(channel_id)?
            .iter_mut()
            .find(|participant| &participant.connection_id == connection_id)?;
        participant.flags = flags;
        Some(self.roster(channel_id))
    }

    /// 接続が参加しているチャンネル（あれば）から取り除く
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> Option<VoiceRoster> {
        let channel_id = self.location.get(connection_id)?.clone();
        self.remove(&channel_id, connection_id)
    }

    pub fn channel_of(&self, connection_id: &ConnectionId) -> Option<&ChannelId> {
        self.location.get(connection_id)
    }

    /// チャンネルの現在の名簿（誰もいなければ空）
    pub fn roster(&self, channel_id: &ChannelId) -> VoiceRoster {
        VoiceRoster {
            channel_id: channel_id.clone(),
            participants: self.channels.get(channel_id).cloned().unwrap_or_default(),
        }
    }

    /// 参加者のいる全チャンネルの名簿（チャンネル ID 昇順）
    pub fn rosters(&self) -> Vec<VoiceRoster> {
        let mut channel_ids: Vec<&ChannelId> = self.channels.keys().collect();
        channel_ids.sort();
        channel_ids
            .into_iter()
            .map(|channel_id| self.roster(channel_id))
            .collect()
    }

    fn remove(
        &mut self,
        channel_id: &ChannelId,
        connection_id: &ConnectionId,
    ) -> Option<VoiceRoster> {
        let roster = self.channels.get_mut(channel_id)?;
        let position = roster
            .iter()
            .position(|participant| &participant.connection_id == connection_id)?;
        roster.remove(position);
        if roster.is_empty() {
            self.channels.remove(channel_id);
        }
        self.location.remove(connection_id);

        Some(VoiceRoster {
            channel_id: channel_id.clone(),
            participants: self.channels.get(channel_id).cloned().unwrap_or_default(),
        })
    }
}
