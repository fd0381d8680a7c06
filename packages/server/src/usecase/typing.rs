//! UseCase: 入力中表示

use crate::domain::{ChannelId, Notification, RealtimeState, RoomId, Timestamp, UserId};

use super::delivery::{ConnectionContext, Outbound};

/// チャンネルの現在の入力中スナップショットをルーム全員（送信者を含む）へ
pub fn typing_update(state: &RealtimeState, now: Timestamp, channel_id: &ChannelId) -> Outbound {
    Outbound::to_room(
        RoomId::channel(channel_id),
        None,
        Notification::TypingUpdate {
            channel_id: channel_id.clone(),
            users: state.typing.snapshot(channel_id, now),
        },
    )
}

/// `typing:start`
pub fn start_typing(
    _ctx: &ConnectionContext,
    state: &mut RealtimeState,
    now: Timestamp,
    channel_id: ChannelId,
    user_id: UserId,
    display_name: String,
) -> Vec<Outbound> {
    let users = state.typing.start(&channel_id, user_id, display_name, now);
    vec![Outbound::to_room(
        RoomId::channel(&channel_id),
        None,
        Notification::TypingUpdate { channel_id, users },
    )]
}

/// `typing:stop`。エントリが無くてもスナップショットは送る。
pub fn stop_typing(
    _ctx: &ConnectionContext,
    state: &mut RealtimeState,
    now: Timestamp,
    channel_id: ChannelId,
    user_id: UserId,
) -> Vec<Outbound> {
    if !state.typing.stop(&channel_id, &user_id) {
        tracing::debug!(
            "No typing entry for '{}' in '{}', sending snapshot anyway",
            user_id,
            channel_id
        );
    }
    vec![typing_update(state, now, &channel_id)]
}

/// オフラインになったユーザーの入力中表示を全チャンネルから消す
pub fn clear_user(state: &mut RealtimeState, now: Timestamp, user_id: &UserId) -> Vec<Outbound> {
    state
        .typing
        .remove_user(user_id)
        .iter()
        .map(|channel_id| typing_update(state, now, channel_id))
        .collect()
}
