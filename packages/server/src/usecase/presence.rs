//! Presence Aggregator
//!
//! Connection Registry の遷移をエッジトリガーのプレゼンス通知に変換する。
//! 0→1 と 1→0 の遷移だけが `presence:update` になり、2 つ目以降のタブの開閉は何も送らない。

use crate::domain::{
    ConnectionId, Notification, RealtimeState, Registered, Unregistered, UserId,
};

use super::delivery::Outbound;

/// 登録直後の通知
///
/// オンラインになった場合は全体へ `presence:update`、常に新しい接続へ
/// 現在のオンラインユーザー全員の `presence:state` を送る。
pub fn on_registered(
    state: &RealtimeState,
    connection_id: &ConnectionId,
    user_id: Option<&UserId>,
    registered: Registered,
) -> Vec<Outbound> {
    let mut outbound = Vec::with_capacity(2);
    if registered.became_online
        && let Some(user_id) = user_id
    {
        tracing::info!("User '{}' is now online", user_id);
        outbound.push(Outbound::to_everyone(Notification::PresenceUpdate {
            user_id: user_id.clone(),
            is_online: true,
        }));
    }
    outbound.push(Outbound::to_connection(
        connection_id.clone(),
        presence_state(state),
    ));
    outbound
}

/// 登録解除直後の通知（最後の接続が閉じた場合のみ）
pub fn on_unregistered(unregistered: &Unregistered) -> Option<Outbound> {
    let user_id = unregistered.became_offline.as_ref()?;
    tracing::info!("User '{}' is now offline", user_id);
    Some(Outbound::to_everyone(Notification::PresenceUpdate {
        user_id: user_id.clone(),
        is_online: false,
    }))
}

/// 現在のオンラインユーザー全員（差分ではない）
pub fn presence_state(state: &RealtimeState) -> Notification {
    Notification::PresenceState {
        online_users: state.registry.online_users().into_iter().collect(),
    }
}
