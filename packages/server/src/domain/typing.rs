//! Typing Tracker
//!
//! チャンネルごとの「入力中」表示。エントリは TTL を過ぎると論理的に期限切れとなり、
//! 物理的に削除されていなくてもスナップショットには現れない（遅延失効）。

use std::collections::HashMap;

use super::{ChannelId, Timestamp, UserId};

/// TTL のデフォルト値（ミリ秒）
pub const DEFAULT_TYPING_TTL_MILLIS: i64 = 3_000;
/// 受け付ける TTL の範囲（ミリ秒）
pub const MIN_TYPING_TTL_MILLIS: i64 = 2_000;
pub const MAX_TYPING_TTL_MILLIS: i64 = 5_000;

/// スナップショットに含まれる入力中ユーザー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingUser {
    pub user_id: UserId,
    pub display_name: String,
}

#[derive(Debug, Clone)]
struct TypingEntry {
    display_name: String,
    started_at: Timestamp,
    refreshed_at: Timestamp,
}

#[derive(Debug)]
pub struct TypingTracker {
    ttl_millis: i64,
    channels: HashMap<ChannelId, HashMap<UserId, TypingEntry>>,
}

impl Default for TypingTracker {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_TTL_MILLIS)
    }
}

impl TypingTracker {
    /// TTL は [`MIN_TYPING_TTL_MILLIS`]..=[`MAX_TYPING_TTL_MILLIS`] に丸められる
    pub fn new(ttl_millis: i64) -> Self {
        Self {
            ttl_millis: ttl_millis.clamp(MIN_TYPING_TTL_MILLIS, MAX_TYPING_TTL_MILLIS),
            channels: HashMap::new(),
        }
    }

    pub fn ttl_millis(&self) -> i64 {
        self.ttl_millis
    }

    /// 入力開始（既存エントリは時刻と表示名を更新）し、現在のスナップショットを返す
    pub fn start(
        &mut self,
        channel_id: &ChannelId,
        user_id: UserId,
        display_name: String,
        now: Timestamp,
    ) -> Vec<TypingUser> {
        let ttl = self.ttl_millis;
        let entries = self.channels.entry(channel_id.clone()).or_default();
        let live = entries
            .get(&user_id)
            .is_some_and(|entry| now.millis_since(entry.refreshed_at) < ttl);
        if live {
            if let Some(entry) = entries.get_mut(&user_id) {
                entry.display_name = display_name;
                entry.refreshed_at = now;
            }
        } else {
            // 期限切れのエントリは新規扱い
            entries.insert(
                user_id,
                TypingEntry {
                    display_name,
                    started_at: now,
                    refreshed_at: now,
                },
            );
        }
        self.snapshot(channel_id, now)
    }

    /// 入力終了。エントリが無ければ何もしない。削除したかどうかを返す。
    pub fn stop(&mut self, channel_id: &ChannelId, user_id: &UserId) -> bool {
        let Some(entries) = self.channels.get_mut(channel_id) else {
            return false;
        };
        let removed = entries.remove(user_id).is_some();
        if entries.is_empty() {
            self.channels.remove(channel_id);
        }
        removed
    }

    /// TTL 内のエントリだけを返す（開始順、同時刻はユーザー ID 順）
    pub fn snapshot(&self, channel_id: &ChannelId, now: Timestamp) -> Vec<TypingUser> {
        let Some(entries) = self.channels.get(channel_id) else {
            return Vec::new();
        };

        let mut live: Vec<(&UserId, &TypingEntry)> = entries
            .iter()
            .filter(|(_, entry)| now.millis_since(entry.refreshed_at) < self.ttl_millis)
            .collect();
        live.sort_by(|(a_id, a), (b_id, b)| {
            a.started_at.cmp(&b.started_at).then_with(|| a_id.cmp(b_id))
        });

        live.into_iter()
            .map(|(user_id, entry)| TypingUser {
                user_id: user_id.clone(),
                display_name: entry.display_name.clone(),
            })
            .collect()
    }

    /// ユーザーの全エントリを削除し、影響を受けたチャンネルを返す（昇順）
    pub fn remove_user(&mut self, user_id: &UserId) -> Vec<ChannelId> {
        let mut affected: Vec<ChannelId> = self
            .channels
            .iter_mut()
            .filter_map(|(channel_id, entries)| {
                entries.remove(user_id).map(|_| channel_id.clone())
            })
            .collect();
        self.channels.retain(|_, entries| !entries.is_empty());
        affected.sort();
        affected
    }

    /// 期限切れエントリを物理削除し、削除件数を返す
    pub fn purge_expired(&mut self, now: Timestamp) -> usize {
        let ttl = self.ttl_millis;
        let mut purged = 0;
        for entries in self.channels.values_mut() {
            let before = entries.len();
            entries.retain(|_, entry| now.millis_since(entry.refreshed_at) < ttl);
            purged += before - entries.len();
        }
        self.channels.retain(|_, entries| !entries.is_empty());
        purged
    }

    /// 物理的に保持しているエントリ数（期限切れを含む）
    pub fn stored_entries(&self) -> usize {
        self.channels.values().map(HashMap::len).sum()
    }
}
